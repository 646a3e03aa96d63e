//! Test fixtures: small JPEGs with and without a GPS fix, multipart bodies.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "geophoto-test-boundary";

/// Degrees, minutes and whole seconds with a hemisphere letter.
#[derive(Clone, Copy, Debug)]
pub struct Fix {
    pub lat_ref: &'static str,
    pub lat: (u32, u32, u32),
    pub lon_ref: &'static str,
    pub lon: (u32, u32, u32),
}

/// N 40°30'0" W 73°57'0", i.e. 40.5 / -73.95.
#[allow(dead_code)]
pub const MANHATTAN: Fix = Fix {
    lat_ref: "N",
    lat: (40, 30, 0),
    lon_ref: "W",
    lon: (73, 57, 0),
};

/// S 33°52'0" E 151°12'0".
#[allow(dead_code)]
pub const SYDNEY: Fix = Fix {
    lat_ref: "S",
    lat: (33, 52, 0),
    lon_ref: "E",
    lon: (151, 12, 0),
};

/// A 320x240 gradient JPEG without any metadata.
pub fn plain_jpeg() -> Vec<u8> {
    let img = RgbImage::from_fn(320, 240, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .expect("Failed to encode test JPEG");
    buf
}

/// [`plain_jpeg`] carrying `fix` in its EXIF GPS IFD.
#[allow(dead_code)]
pub fn geotagged_jpeg(fix: Fix) -> Vec<u8> {
    thumbnail::embed_exif(&plain_jpeg(), &gps_tiff(fix)).expect("Failed to embed test EXIF")
}

/// A JPEG stream with a readable GPS fix but no image data to decode.
#[allow(dead_code)]
pub fn undecodable_geotagged_jpeg(fix: Fix) -> Vec<u8> {
    thumbnail::embed_exif(&[0xFF, 0xD8, 0xFF, 0xD9], &gps_tiff(fix))
        .expect("Failed to embed test EXIF")
}

fn gps_tiff(fix: Fix) -> Vec<u8> {
    let fields = [
        ascii(Tag::GPSLatitudeRef, fix.lat_ref),
        dms(Tag::GPSLatitude, fix.lat),
        ascii(Tag::GPSLongitudeRef, fix.lon_ref),
        dms(Tag::GPSLongitude, fix.lon),
    ];

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer
        .write(&mut tiff, false)
        .expect("Failed to write test EXIF");
    tiff.into_inner()
}

/// A `multipart/form-data` body with one `image` part per file.
#[allow(dead_code)]
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (file_name, data) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn ascii(tag: Tag, letter: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![letter.as_bytes().to_vec()]),
    }
}

fn dms(tag: Tag, (d, m, s): (u32, u32, u32)) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(vec![
            Rational { num: d, denom: 1 },
            Rational { num: m, denom: 1 },
            Rational { num: s, denom: 1 },
        ]),
    }
}
