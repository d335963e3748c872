use std::path::Path;

use image::{ImageError, ImageReader, RgbImage};

use crate::{Error, Result};

/// Open and decode an image file into 8-bit RGB
pub(crate) fn open_image(file: &Path) -> Result<RgbImage> {
    let decode = || -> std::result::Result<RgbImage, ImageError> {
        let image_reader = ImageReader::open(file)?.with_guessed_format()?;
        Ok(image_reader.decode()?.to_rgb8())
    };
    let image = decode().map_err(|source| Error::Decode {
        path: file.to_owned(),
        source,
    })?;
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyImage {
            path: file.to_owned(),
        });
    }
    Ok(image)
}
