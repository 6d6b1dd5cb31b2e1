//! Embedding JPEG and PNG images as PDF image XObjects

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::input::{ImageKind, InputFile};

/// An image XObject added to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub id: ObjectId,
    /// Natural width in pixels
    pub width: u32,
    /// Natural height in pixels
    pub height: u32,
}

/// Decode `file` according to its declared image kind and add it to `doc`
pub fn embed_image(
    doc: &mut Document,
    file: &InputFile,
    kind: &ImageKind,
) -> Result<EmbeddedImage> {
    let embed_error = |e: image::ImageError| Error::Embed {
        name: file.name().to_string(),
        reason: e.to_string(),
    };

    let embedded = match kind {
        ImageKind::Jpeg => embed_jpeg(doc, &file.data).map_err(embed_error)?,
        ImageKind::Png => embed_png(doc, &file.data).map_err(embed_error)?,
        ImageKind::Other(_) => {
            return Err(Error::UnsupportedImageFormat {
                name: file.name().to_string(),
                media_type: file.info.media_type.clone(),
            })
        }
    };

    if embedded.width == 0 || embedded.height == 0 {
        return Err(Error::Embed {
            name: file.name().to_string(),
            reason: "image has zero width or height".to_string(),
        });
    }

    Ok(embedded)
}

/// JPEG data is passed through untouched with `DCTDecode`; only the header is
/// decoded for dimensions and colour space.
fn embed_jpeg(doc: &mut Document, data: &[u8]) -> image::ImageResult<EmbeddedImage> {
    let decoder = ImageReader::with_format(Cursor::new(data), ImageFormat::Jpeg).into_decoder()?;
    let (width, height) = decoder.dimensions();
    // The decoder reports CMYK as RGB since it converts on decode
    let header = JpegHeader::scan(data);
    let cmyk = header.components == Some(4);
    let color_space = if cmyk {
        "DeviceCMYK"
    } else if decoder.color_type().has_color() {
        "DeviceRGB"
    } else {
        "DeviceGray"
    };

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
        "Length" => data.len() as i64,
    };
    // Adobe-written CMYK stores inverted samples
    if cmyk && header.adobe {
        dict.set(
            "Decode",
            (0..4)
                .flat_map(|_| [Object::Integer(1), Object::Integer(0)])
                .collect::<Vec<Object>>(),
        );
    }

    let stream = Stream {
        dict,
        content: data.to_vec(),
        allows_compression: false,
        start_position: None,
    };

    let id = doc.add_object(Object::Stream(stream));
    Ok(EmbeddedImage { id, width, height })
}

/// What the marker segments before the first scan say about a JPEG
#[derive(Debug, Default, PartialEq, Eq)]
struct JpegHeader {
    /// Component count from the frame header
    components: Option<u8>,
    /// An Adobe APP14 segment is present
    adobe: bool,
}

impl JpegHeader {
    fn scan(data: &[u8]) -> Self {
        let mut header = JpegHeader::default();
        let mut pos = 2;
        while pos + 4 <= data.len() && data[pos] == 0xFF {
            let marker = data[pos + 1];
            // Start of scan: header segments are over
            if marker == 0xDA {
                break;
            }
            let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            if length < 2 {
                break;
            }
            let body = &data[pos + 4..data.len().min(pos + 2 + length)];
            match marker {
                0xEE if body.starts_with(b"Adobe") => header.adobe = true,
                // SOF0..SOF15, minus DHT, JPG and DAC
                0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) && body.len() > 5 => {
                    header.components = Some(body[5]);
                }
                _ => {}
            }
            pos += 2 + length;
        }
        header
    }
}

/// PNG data is decoded to 8-bit samples; transparency becomes an `SMask`.
/// The streams are left unfiltered and get compressed when the document is.
fn embed_png(doc: &mut Document, data: &[u8]) -> image::ImageResult<EmbeddedImage> {
    let img = ImageReader::with_format(Cursor::new(data), ImageFormat::Png).decode()?;
    let (width, height) = (img.width(), img.height());
    let color = img.color();

    let (samples, color_space, alpha) = split_channels(&img, color.has_color(), color.has_alpha());

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
    };

    if let Some(alpha) = alpha {
        let smask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));
        dict.set("SMask", Object::Reference(smask_id));
    }

    let id = doc.add_object(Stream::new(dict, samples));
    Ok(EmbeddedImage { id, width, height })
}

/// Returns (colour samples, colour space name, optional alpha samples)
fn split_channels(
    img: &DynamicImage,
    has_color: bool,
    has_alpha: bool,
) -> (Vec<u8>, &'static str, Option<Vec<u8>>) {
    match (has_color, has_alpha) {
        (true, true) => {
            let rgba = img.to_rgba8();
            let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
            let mut alpha = Vec::with_capacity(rgba.len() / 4);
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel[3]);
            }
            (rgb, "DeviceRGB", Some(alpha))
        }
        (false, true) => {
            let la = img.to_luma_alpha8();
            let mut gray = Vec::with_capacity(la.len() / 2);
            let mut alpha = Vec::with_capacity(la.len() / 2);
            for pixel in la.pixels() {
                gray.push(pixel[0]);
                alpha.push(pixel[1]);
            }
            (gray, "DeviceGray", Some(alpha))
        }
        (true, false) => (img.to_rgb8().into_raw(), "DeviceRGB", None),
        (false, false) => (img.to_luma8().into_raw(), "DeviceGray", None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn stream_dict(doc: &Document, id: ObjectId) -> lopdf::Dictionary {
        match doc.get_object(id).unwrap() {
            Object::Stream(stream) => stream.dict.clone(),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_png_with_alpha_gets_smask() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 128]));
        let file = InputFile::new(
            "a.png",
            "image/png",
            encode(DynamicImage::ImageRgba8(img), ImageFormat::Png),
        );

        let mut doc = Document::with_version("1.7");
        let embedded = embed_image(&mut doc, &file, &ImageKind::Png).unwrap();
        assert_eq!((embedded.width, embedded.height), (3, 2));

        let dict = stream_dict(&doc, embedded.id);
        assert_eq!(dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");
        let smask = dict.get(b"SMask").unwrap().as_reference().unwrap();
        match doc.get_object(smask).unwrap() {
            Object::Stream(s) => assert_eq!(s.content, vec![128; 6]),
            _ => panic!("SMask should be a stream"),
        }
    }

    #[test]
    fn test_grayscale_png_stays_gray() {
        let img = GrayImage::from_pixel(4, 4, Luma([200]));
        let file = InputFile::new(
            "g.png",
            "image/png",
            encode(DynamicImage::ImageLuma8(img), ImageFormat::Png),
        );

        let mut doc = Document::with_version("1.7");
        let embedded = embed_image(&mut doc, &file, &ImageKind::Png).unwrap();
        let dict = stream_dict(&doc, embedded.id);
        assert_eq!(dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceGray");
        assert!(dict.get(b"SMask").is_err());
    }

    #[test]
    fn test_jpeg_passed_through() {
        let img = DynamicImage::new_rgb8(8, 5);
        let bytes = encode(img, ImageFormat::Jpeg);
        let file = InputFile::new("p.jpg", "image/jpeg", bytes.clone());

        let mut doc = Document::with_version("1.7");
        let embedded = embed_image(&mut doc, &file, &ImageKind::Jpeg).unwrap();
        assert_eq!((embedded.width, embedded.height), (8, 5));
        match doc.get_object(embedded.id).unwrap() {
            Object::Stream(s) => {
                assert_eq!(s.content, bytes);
                assert_eq!(s.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
            }
            _ => panic!("expected stream"),
        }
    }

    #[test]
    fn test_cmyk_jpeg_keeps_cmyk_colour_space() {
        let mut bytes = Vec::new();
        let encoder = jpeg_encoder::Encoder::new(&mut bytes, 90);
        let pixels = [0u8, 64, 128, 255].repeat(16 * 16);
        encoder
            .encode(&pixels, 16, 16, jpeg_encoder::ColorType::Cmyk)
            .unwrap();
        let file = InputFile::new("print.jpg", "image/jpeg", bytes.clone());

        let mut doc = Document::with_version("1.7");
        let embedded = embed_image(&mut doc, &file, &ImageKind::Jpeg).unwrap();
        assert_eq!((embedded.width, embedded.height), (16, 16));

        let dict = stream_dict(&doc, embedded.id);
        assert_eq!(dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceCMYK");
        assert_eq!(dict.get(b"Decode").is_ok(), JpegHeader::scan(&bytes).adobe);
    }

    #[test]
    fn test_rgb_jpeg_has_no_decode_array() {
        let bytes = encode(DynamicImage::new_rgb8(4, 4), ImageFormat::Jpeg);
        let file = InputFile::new("rgb.jpg", "image/jpeg", bytes);
        let mut doc = Document::with_version("1.7");
        let embedded = embed_image(&mut doc, &file, &ImageKind::Jpeg).unwrap();
        let dict = stream_dict(&doc, embedded.id);
        assert_eq!(dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");
        assert!(dict.get(b"Decode").is_err());
    }

    #[test]
    fn test_jpeg_header_scan() {
        let rgb = encode(DynamicImage::new_rgb8(4, 4), ImageFormat::Jpeg);
        let header = JpegHeader::scan(&rgb);
        assert_eq!(header.components, Some(3));
        assert!(!header.adobe);

        let gray = encode(DynamicImage::new_luma8(4, 4), ImageFormat::Jpeg);
        assert_eq!(JpegHeader::scan(&gray).components, Some(1));

        let mut with_app14 = vec![0xFF, 0xD8, 0xFF, 0xEE, 0x00, 0x0E];
        with_app14.extend_from_slice(b"Adobe\0\x64\0\0\0\0\x02");
        with_app14.extend_from_slice(&[0xFF, 0xDA]);
        assert!(JpegHeader::scan(&with_app14).adobe);

        assert_eq!(JpegHeader::scan(&[0xFF, 0xD8]), JpegHeader::default());
    }

    #[test]
    fn test_undecodable_image_names_file() {
        let file = InputFile::new("broken.png", "image/png", b"definitely not a png".to_vec());
        let mut doc = Document::with_version("1.7");
        let err = embed_image(&mut doc, &file, &ImageKind::Png).unwrap_err();
        assert!(matches!(err, Error::Embed { .. }));
        assert_eq!(err.file_name(), Some("broken.png"));
    }

    #[test]
    fn test_png_bytes_declared_as_jpeg_fail() {
        let img = GrayImage::new(2, 2);
        let file = InputFile::new(
            "x.jpg",
            "image/jpeg",
            encode(DynamicImage::ImageLuma8(img), ImageFormat::Png),
        );
        let mut doc = Document::with_version("1.7");
        assert!(matches!(
            embed_image(&mut doc, &file, &ImageKind::Jpeg),
            Err(Error::Embed { .. })
        ));
    }

    #[test]
    fn test_other_subtype_unsupported() {
        let file = InputFile::new("a.gif", "image/gif", vec![0; 16]);
        let mut doc = Document::with_version("1.7");
        let err = embed_image(&mut doc, &file, &ImageKind::Other("gif".into())).unwrap_err();
        assert!(err.to_string().contains("unsupported image format"));
    }
}
