use crate::element::Element;
use crate::LoadError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use byteorder::{ByteOrder, LittleEndian};
use libflate::{gzip, zlib};
use std::io::{self, Cursor, Read};

/// How a layer's cells are written in its `<data>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// One `<tile gid="..."/>` element per cell.
    #[default]
    Xml,
    /// Base64 of little-endian 32-bit words, possibly compressed.
    Base64,
    /// Comma separated decimal words.
    Csv,
}

impl Encoding {
    /// Unknown values keep the default, as the editor does.
    pub(crate) fn from_attr(value: Option<&str>) -> Self {
        match value {
            None => Encoding::Xml,
            Some("base64") => Encoding::Base64,
            Some("csv") => Encoding::Csv,
            Some(other) => {
                log::warn!("unknown tile data encoding \"{other}\", reading as XML");
                Encoding::Xml
            }
        }
    }
}

/// How a base64 payload is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Raw words.
    #[default]
    None,
    /// A zlib stream.
    Zlib,
    /// A gzip member.
    Gzip,
}

impl Compression {
    pub(crate) fn from_attr(value: Option<&str>) -> Self {
        match value {
            None => Compression::None,
            Some("zlib") => Compression::Zlib,
            Some("gzip") => Compression::Gzip,
            Some(other) => {
                log::warn!("unknown tile data compression \"{other}\", reading uncompressed");
                Compression::None
            }
        }
    }
}

/// Number of cells in a `width` by `height` grid.
fn cell_count(width: u32, height: u32) -> Result<usize, LoadError> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|count| count.checked_mul(4).is_some())
        .ok_or_else(|| LoadError::DocumentMalformed(format!("layer size {width}x{height} is too large")))
}

/// Decode a layer's `<data>` element into raw cell words, row-major.
pub(crate) fn decode_element(
    data: &Element,
    width: u32,
    height: u32,
) -> Result<(Encoding, Compression, Vec<u32>), LoadError> {
    let encoding = Encoding::from_attr(data.attr("encoding"));
    let compression = Compression::from_attr(data.attr("compression"));
    let words = match encoding {
        Encoding::Xml => {
            let expected = cell_count(width, height)?;
            let words = data
                .children_named("tile")
                .take(expected)
                .map(|tile| match tile.attr("gid") {
                    // Empty cells are commonly written as a bare <tile/>
                    None => Ok(0),
                    Some(gid) => gid
                        .trim()
                        .parse()
                        .map_err(|_| LoadError::malformed("tile gid", gid)),
                })
                .collect::<Result<Vec<u32>, _>>()?;
            if words.len() < expected {
                return Err(LoadError::TruncatedGrid {
                    expected,
                    found: words.len(),
                });
            }
            words
        }
        Encoding::Base64 | Encoding::Csv => decode_text(
            data.text().unwrap_or_default(),
            encoding,
            compression,
            width,
            height,
        )?,
    };
    Ok((encoding, compression, words))
}

/// Decode a textual cell payload into exactly `width * height` raw cell words, row-major.
///
/// `compression` only applies to [`Encoding::Base64`]. The XML encoding has no textual form,
/// so passing [`Encoding::Xml`] fails unless the grid is empty.
///
/// # Errors
/// Errors if the payload is malformed or doesn't hold exactly `width * height` cells.
pub fn decode_text(
    text: &str,
    encoding: Encoding,
    compression: Compression,
    width: u32,
    height: u32,
) -> Result<Vec<u32>, LoadError> {
    let expected = cell_count(width, height)?;
    let words = match encoding {
        Encoding::Xml => Vec::new(),
        Encoding::Csv => {
            let mut tokens: Vec<&str> = text.trim().split([',', ';']).map(str::trim).collect();
            // A trailing separator doesn't start another cell
            if tokens.last().is_some_and(|token| token.is_empty()) {
                tokens.pop();
            }
            tokens
                .into_iter()
                .map(|token| match token {
                    "" => Ok(0),
                    token => token
                        .parse()
                        .map_err(|_| LoadError::malformed("tile gid", token)),
                })
                .collect::<Result<Vec<u32>, _>>()?
        }
        Encoding::Base64 => {
            let bytes = STANDARD.decode(text.trim())?;
            let expected_bytes = expected * 4;
            let bytes = match compression {
                Compression::None => {
                    if bytes.len() != expected_bytes {
                        return Err(LoadError::TruncatedGrid {
                            expected,
                            found: bytes.len() / 4,
                        });
                    }
                    bytes
                }
                Compression::Zlib => zlib::Decoder::new(Cursor::new(bytes))
                    .and_then(|decoder| inflate_exact(decoder, expected_bytes))
                    .map_err(LoadError::DecompressionFailed)?,
                Compression::Gzip => gzip::Decoder::new(Cursor::new(bytes))
                    .and_then(|decoder| inflate_exact(decoder, expected_bytes))
                    .map_err(LoadError::DecompressionFailed)?,
            };
            let mut words = vec![0; bytes.len() / 4];
            LittleEndian::read_u32_into(&bytes, &mut words);
            words
        }
    };
    if words.len() != expected {
        return Err(LoadError::TruncatedGrid {
            expected,
            found: words.len(),
        });
    }
    Ok(words)
}

/// Decompress a stream whose output must be exactly `expected` bytes long.
fn inflate_exact(decoder: impl Read, expected: usize) -> io::Result<Vec<u8>> {
    // The declared size can't be trusted until the stream backs it up
    let mut decoded = Vec::new();
    // Read one byte past the limit to notice oversized streams without inflating all of them
    decoder
        .take(expected as u64 + 1)
        .read_to_end(&mut decoded)?;
    if decoded.len() != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "decompressed tile data was {} bytes, expected {expected}",
                decoded.len()
            ),
        ));
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use libflate::{gzip, zlib};
    use std::io::Write;

    const WORDS: [u32; 6] = [1, 2, 0, 0x8000_0003, 50, 0x4000_0001];

    fn raw_bytes(words: &[u32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for &word in words {
            bytes.write_u32::<LittleEndian>(word).unwrap();
        }
        bytes
    }

    fn zlib_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = zlib::Encoder::new(Vec::new()).unwrap();
        encoder.write_all(data).unwrap();
        encoder.finish().into_result().unwrap()
    }

    fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = gzip::Encoder::new(Vec::new()).unwrap();
        encoder.write_all(data).unwrap();
        encoder.finish().into_result().unwrap()
    }

    #[test]
    fn every_encoding_agrees() {
        let csv = "\n1,2,0,\n2147483651,50,1073741825\n";
        let plain = STANDARD.encode(raw_bytes(&WORDS));
        let zlib = STANDARD.encode(zlib_bytes(&raw_bytes(&WORDS)));
        let gzip = STANDARD.encode(gzip_bytes(&raw_bytes(&WORDS)));
        let xml = Element::parse(
            r#"<data>
                <tile gid="1"/><tile gid="2"/><tile/>
                <tile gid="2147483651"/><tile gid="50"/><tile gid="1073741825"/>
            </data>"#,
        )
        .unwrap();

        assert_eq!(decode_text(csv, Encoding::Csv, Compression::None, 3, 2).unwrap(), WORDS);
        assert_eq!(
            decode_text(&plain, Encoding::Base64, Compression::None, 3, 2).unwrap(),
            WORDS
        );
        assert_eq!(
            decode_text(&format!("\n   {zlib}\n  "), Encoding::Base64, Compression::Zlib, 3, 2)
                .unwrap(),
            WORDS
        );
        assert_eq!(
            decode_text(&gzip, Encoding::Base64, Compression::Gzip, 3, 2).unwrap(),
            WORDS
        );
        let (encoding, compression, words) = decode_element(&xml, 3, 2).unwrap();
        assert_eq!((encoding, compression), (Encoding::Xml, Compression::None));
        assert_eq!(words, WORDS);
    }

    #[test]
    fn zlib_round_trip() {
        for (w, h) in [(1, 1), (4, 3), (16, 9)] {
            let words: Vec<u32> = (0..w * h).map(|i| i * 7 + 1).collect();
            let encoded = STANDARD.encode(zlib_bytes(&raw_bytes(&words)));
            let decoded = decode_text(&encoded, Encoding::Base64, Compression::Zlib, w, h).unwrap();
            let again = STANDARD.encode(zlib_bytes(&raw_bytes(&decoded)));
            assert_eq!(
                decode_text(&again, Encoding::Base64, Compression::Zlib, w, h).unwrap(),
                words
            );
        }
    }

    #[test]
    fn csv_separators_and_whitespace() {
        let comma = decode_text(" 1,2,3 ", Encoding::Csv, Compression::None, 3, 1).unwrap();
        let semicolon = decode_text("\t1; 2 ;3\n", Encoding::Csv, Compression::None, 3, 1).unwrap();
        assert_eq!(comma, [1, 2, 3]);
        assert_eq!(comma, semicolon);
    }

    #[test]
    fn csv_empty_tokens_are_empty_cells() {
        assert_eq!(
            decode_text("1,,2", Encoding::Csv, Compression::None, 3, 1).unwrap(),
            [1, 0, 2]
        );
        assert_eq!(
            decode_text("1, ;2,\n", Encoding::Csv, Compression::None, 3, 1).unwrap(),
            [1, 0, 2]
        );
        assert_eq!(
            decode_text("1,2,,", Encoding::Csv, Compression::None, 3, 1).unwrap(),
            [1, 2, 0]
        );
        assert!(decode_text("", Encoding::Csv, Compression::None, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn huge_declared_size_is_an_error() {
        let zlib = STANDARD.encode(zlib_bytes(&raw_bytes(&WORDS)));
        let gzip = STANDARD.encode(gzip_bytes(&raw_bytes(&WORDS)));
        let plain = STANDARD.encode(raw_bytes(&WORDS));
        for (text, compression) in [
            (&zlib, Compression::Zlib),
            (&gzip, Compression::Gzip),
            (&plain, Compression::None),
        ] {
            let decoded = decode_text(text, Encoding::Base64, compression, 2_147_483_648, 1_073_741_824);
            assert!(matches!(
                decoded,
                Err(LoadError::DecompressionFailed(_)
                    | LoadError::TruncatedGrid { .. }
                    | LoadError::DocumentMalformed(_))
            ));
        }
    }

    #[test]
    fn csv_count_must_match() {
        assert!(matches!(
            decode_text("1,2", Encoding::Csv, Compression::None, 3, 1),
            Err(LoadError::TruncatedGrid { expected: 3, found: 2 })
        ));
        assert!(matches!(
            decode_text("1,2,3,4", Encoding::Csv, Compression::None, 3, 1),
            Err(LoadError::TruncatedGrid { expected: 3, found: 4 })
        ));
        assert!(matches!(
            decode_text("1,x,3", Encoding::Csv, Compression::None, 3, 1),
            Err(LoadError::MalformedValue { .. })
        ));
    }

    #[test]
    fn xml_truncation_and_excess() {
        let short = Element::parse(r#"<data><tile gid="1"/><tile gid="2"/></data>"#).unwrap();
        assert!(matches!(
            decode_element(&short, 3, 1),
            Err(LoadError::TruncatedGrid { expected: 3, found: 2 })
        ));
        let (_, _, words) = decode_element(&short, 1, 1).unwrap();
        assert_eq!(words, [1]);
    }

    #[test]
    fn base64_failures() {
        let plain = STANDARD.encode(raw_bytes(&WORDS));
        assert!(matches!(
            decode_text(&plain, Encoding::Base64, Compression::None, 4, 2),
            Err(LoadError::TruncatedGrid { expected: 8, found: 6 })
        ));
        assert!(matches!(
            decode_text("not base64!", Encoding::Base64, Compression::None, 3, 2),
            Err(LoadError::InvalidBase64(_))
        ));
        // Valid base64, but not a zlib stream
        assert!(matches!(
            decode_text(&plain, Encoding::Base64, Compression::Zlib, 3, 2),
            Err(LoadError::DecompressionFailed(_))
        ));
        assert!(matches!(
            decode_text(&plain, Encoding::Base64, Compression::Gzip, 3, 2),
            Err(LoadError::DecompressionFailed(_))
        ));
        // A well formed stream of the wrong size
        let zlib = STANDARD.encode(zlib_bytes(&raw_bytes(&WORDS)));
        assert!(matches!(
            decode_text(&zlib, Encoding::Base64, Compression::Zlib, 2, 2),
            Err(LoadError::DecompressionFailed(_))
        ));
        assert!(matches!(
            decode_text(&zlib, Encoding::Base64, Compression::Zlib, 4, 2),
            Err(LoadError::DecompressionFailed(_))
        ));
        let gzip = STANDARD.encode(gzip_bytes(&raw_bytes(&WORDS)));
        assert!(matches!(
            decode_text(&gzip, Encoding::Base64, Compression::Gzip, 5, 5),
            Err(LoadError::DecompressionFailed(_))
        ));
    }

    #[test]
    fn unknown_attributes_keep_defaults() {
        assert_eq!(Encoding::from_attr(Some("yaml")), Encoding::Xml);
        assert_eq!(Compression::from_attr(Some("zstd")), Compression::None);
        assert_eq!(Encoding::from_attr(Some("csv")), Encoding::Csv);
        assert_eq!(Compression::from_attr(Some("gzip")), Compression::Gzip);
    }
}
