//! Image acquisition: gallery files and piped captures, decoded to grayscale.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("capture cancelled: no image data received")]
    Cancelled,
    #[error("permission denied reading {0}")]
    PermissionDenied(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read capture from stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image dimensions are zero")]
    ZeroDimensions,
}

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file picked from disk.
    Gallery(PathBuf),
    /// Encoded image bytes piped on stdin.
    Capture,
}

impl ImageSource {
    /// `-` selects stdin, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Capture
        } else {
            Self::Gallery(PathBuf::from(arg))
        }
    }
}

/// Row-major 8-bit grayscale frame, the input format of the detector.
#[derive(Debug, Clone)]
pub struct GrayFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl GrayFrame {
    pub fn from_image(image: &image::DynamicImage) -> Result<Self, AcquireError> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(AcquireError::ZeroDimensions);
        }
        Ok(Self {
            data: gray.into_raw(),
            width,
            height,
        })
    }
}

/// Read and decode an image from the given source.
pub fn acquire(source: &ImageSource) -> Result<GrayFrame, AcquireError> {
    let bytes = match source {
        ImageSource::Gallery(path) => read_gallery(path)?,
        ImageSource::Capture => read_capture(io::stdin().lock())?,
    };
    decode(&bytes)
}

/// Decode encoded image bytes (PNG, JPEG, ...) to a grayscale frame.
pub fn decode(bytes: &[u8]) -> Result<GrayFrame, AcquireError> {
    let image = image::load_from_memory(bytes)?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        "image decoded"
    );
    GrayFrame::from_image(&image)
}

fn read_gallery(path: &Path) -> Result<Vec<u8>, AcquireError> {
    std::fs::read(path).map_err(|source| gallery_error(path, source))
}

fn gallery_error(path: &Path, source: io::Error) -> AcquireError {
    match source.kind() {
        io::ErrorKind::PermissionDenied => AcquireError::PermissionDenied(path.to_path_buf()),
        _ => AcquireError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}

fn read_capture(mut reader: impl Read) -> Result<Vec<u8>, AcquireError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(AcquireError::Stdin)?;
    if buf.is_empty() {
        return Err(AcquireError::Cancelled);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "corte-acquire-test-{tag}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn test_source_from_arg() {
        assert_eq!(ImageSource::from_arg("-"), ImageSource::Capture);
        assert_eq!(
            ImageSource::from_arg("face.jpg"),
            ImageSource::Gallery(PathBuf::from("face.jpg"))
        );
    }

    #[test]
    fn test_decode_png_to_gray() {
        let frame = decode(&png_bytes(8, 6)).unwrap();
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 6);
        assert_eq!(frame.data.len(), 48);
        assert!(frame.data.iter().all(|&p| p == frame.data[0]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AcquireError::Decode(_)));
    }

    #[test]
    fn test_decode_empty_is_decode_error() {
        assert!(matches!(decode(&[]), Err(AcquireError::Decode(_))));
    }

    #[test]
    fn test_empty_capture_is_cancelled() {
        let err = read_capture(Cursor::new(Vec::<u8>::new())).unwrap_err();
        assert!(matches!(err, AcquireError::Cancelled));
    }

    #[test]
    fn test_capture_reads_all_bytes() {
        let bytes = png_bytes(3, 3);
        assert_eq!(read_capture(Cursor::new(bytes.clone())).unwrap(), bytes);
    }

    #[test]
    fn test_gallery_file() {
        let dir = temp_path("gallery");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("face.png");
        std::fs::write(&path, png_bytes(10, 12)).unwrap();

        let frame = acquire(&ImageSource::Gallery(path)).unwrap();
        assert_eq!((frame.width, frame.height), (10, 12));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_gallery_file_is_not_cancelled() {
        let dir = temp_path("empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.png");
        std::fs::write(&path, b"").unwrap();

        let err = acquire(&ImageSource::Gallery(path)).unwrap_err();
        assert!(matches!(err, AcquireError::Decode(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_gallery_permission_denied_mapping() {
        let path = Path::new("/photos/face.jpg");
        let err = gallery_error(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, AcquireError::PermissionDenied(p) if p == path));

        let err = gallery_error(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, AcquireError::Io { .. }));
    }

    #[test]
    fn test_gallery_missing_file() {
        let err = acquire(&ImageSource::Gallery(temp_path("missing"))).unwrap_err();
        assert!(matches!(err, AcquireError::Io { .. }));
    }
}
