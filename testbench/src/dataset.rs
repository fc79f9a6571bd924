//! Plain-text dataset files.
//!
//! Images are `n * rows * cols` whitespace-separated floats, image after
//! image, each row-major. Labels are `n` whitespace-separated class
//! indices. Anything after the requested count is ignored.

use std::io::Read;

use anyhow::{bail, Context, Result};

fn read_tokens(mut reader: impl Read) -> Result<String> {
    let mut text = String::new();
    reader.read_to_string(&mut text).context("reading dataset")?;
    Ok(text)
}

/// Read `n` images of `rows x cols` samples each.
pub fn read_images(reader: impl Read, n: usize, rows: usize, cols: usize) -> Result<Vec<Vec<f32>>> {
    let text = read_tokens(reader)?;
    let per_image = rows * cols;
    let mut tokens = text.split_whitespace();

    let mut images = Vec::with_capacity(n);
    for i in 0..n {
        let mut pixels = Vec::with_capacity(per_image);
        for j in 0..per_image {
            let Some(token) = tokens.next() else {
                bail!("image data ended at image {i}, sample {j}; expected {n} images of {rows}x{cols}");
            };
            let value: f32 = token
                .parse()
                .with_context(|| format!("image {i}, sample {j}: `{token}` is not a number"))?;
            pixels.push(value);
        }
        images.push(pixels);
    }
    Ok(images)
}

/// Read `n` class labels.
pub fn read_labels(reader: impl Read, n: usize) -> Result<Vec<usize>> {
    let text = read_tokens(reader)?;
    let mut tokens = text.split_whitespace();

    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let Some(token) = tokens.next() else {
            bail!("label data ended after {i} of {n} labels");
        };
        let label: usize = token
            .parse()
            .with_context(|| format!("label {i}: `{token}` is not a class index"))?;
        labels.push(label);
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_images_row_major() {
        let data = "1 2 3 4\n5 6\n7 8.5\n";
        let images = read_images(data.as_bytes(), 2, 2, 2).unwrap();
        assert_eq!(images, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.5]]);
    }

    #[test]
    fn test_read_images_ignores_trailing_data() {
        let images = read_images("0 1 2 3 4 5".as_bytes(), 1, 1, 3).unwrap();
        assert_eq!(images, vec![vec![0.0, 1.0, 2.0]]);
    }

    #[test]
    fn test_read_images_short_file() {
        let err = read_images("1 2 3".as_bytes(), 1, 2, 2).unwrap_err();
        assert!(err.to_string().contains("image 0, sample 3"), "{err}");
    }

    #[test]
    fn test_read_images_bad_token() {
        let err = read_images("1 x 3 4".as_bytes(), 1, 2, 2).unwrap_err();
        assert!(err.to_string().contains("`x`"), "{err}");
    }

    #[test]
    fn test_read_labels() {
        assert_eq!(read_labels("7 2\n1 0".as_bytes(), 3).unwrap(), vec![7, 2, 1]);
        assert!(read_labels("7 -2".as_bytes(), 2).is_err());
        assert!(read_labels("7".as_bytes(), 2).is_err());
    }
}
