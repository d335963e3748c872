pub(crate) fn validate_positive_count(value: &str) -> Result<usize, String> {
    let num = value
        .parse::<usize>()
        .map_err(|_| "Not a valid non-negative integer".to_string())?;
    if num == 0 {
        return Err("Number must be greater than 0".to_string());
    }
    Ok(num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_count() {
        assert_eq!(validate_positive_count("12"), Ok(12));
        assert!(validate_positive_count("0").is_err());
        assert!(validate_positive_count("-3").is_err());
        assert!(validate_positive_count("many").is_err());
    }
}
