//! JPEG metadata segment walker.
//!
//! Collects the APPn segments that carry descriptive metadata so the
//! metadata-aware engine can write them back after re-encoding:
//! - APP1 (`0xFFE1`): EXIF (`Exif\0\0`) and XMP
//! - APP13 (`0xFFED`): Photoshop 8BIM / IPTC-IIM
//! - COM (`0xFFFE`): free-text comments
//!
//! APP0 (JFIF) and APP2 (ICC profile) are left to the encoder, which writes
//! its own.

use tracing::warn;

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const APP13: u8 = 0xED;
const COM: u8 = 0xFE;

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// The 16-bit length field counts itself, leaving this much for the payload.
const MAX_PAYLOAD: usize = u16::MAX as usize - 2;

/// A raw metadata segment: marker byte plus payload (without the length field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSegment {
    pub marker: u8,
    pub payload: Vec<u8>,
}

impl MetadataSegment {
    pub fn is_exif(&self) -> bool {
        self.marker == APP1 && self.payload.starts_with(EXIF_HEADER)
    }

    /// Append the segment, or return `false` if the payload is too long for
    /// a JPEG length field.
    fn write_to(&self, out: &mut Vec<u8>) -> bool {
        let Ok(len) = u16::try_from(self.payload.len() + 2) else {
            return false;
        };
        out.extend_from_slice(&[0xFF, self.marker]);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.payload);
        true
    }
}

fn is_preserved(marker: u8) -> bool {
    matches!(marker, APP1 | APP13 | COM)
}

/// Markers that stand alone without a length field.
fn is_standalone(marker: u8) -> bool {
    marker == SOI || marker == EOI || (0xD0..=0xD7).contains(&marker) || marker == 0x01
}

/// Walk header segments up to SOS, yielding `(marker, start, end)` where
/// `start..end` spans the whole segment including `0xFF marker` and length.
fn header_segments(data: &[u8]) -> Vec<(u8, usize, usize)> {
    let mut found = Vec::new();
    if data.len() < 4 || data[0] != 0xFF || data[1] != SOI {
        return found;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        // Fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if is_standalone(marker) {
            pos += 2;
            continue;
        }
        // SOS means entropy-coded data starts, stop scanning
        if marker == SOS {
            break;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let end = pos + 2 + len;
        if len < 2 || end > data.len() {
            break;
        }
        found.push((marker, pos, end));
        pos = end;
    }
    found
}

/// Extract the preserved metadata segments from a JPEG byte stream.
///
/// Returns an empty list for non-JPEG or malformed input.
pub fn read_metadata_segments(data: &[u8]) -> Vec<MetadataSegment> {
    header_segments(data)
        .into_iter()
        .filter(|(marker, _, _)| is_preserved(*marker))
        .map(|(marker, start, end)| MetadataSegment {
            marker,
            payload: data[start + 4..end].to_vec(),
        })
        .collect()
}

/// Insert `segments` into a freshly encoded JPEG.
///
/// They go after SOI and the encoder's own APP0/APP2 header run, so JFIF stays
/// first. Input that is not a JPEG is returned untouched. Segments whose
/// payload exceeds 65533 bytes cannot be framed and are skipped.
pub fn insert_metadata_segments(jpeg: &[u8], segments: &[MetadataSegment]) -> Vec<u8> {
    if segments.is_empty() || jpeg.len() < 2 || jpeg[0] != 0xFF || jpeg[1] != SOI {
        return jpeg.to_vec();
    }

    let insert_at = header_segments(jpeg)
        .into_iter()
        .take_while(|(marker, _, _)| matches!(*marker, APP0 | APP2))
        .last()
        .map_or(2, |(_, _, end)| end);

    let extra: usize = segments
        .iter()
        .filter(|s| s.payload.len() <= MAX_PAYLOAD)
        .map(|s| s.payload.len() + 4)
        .sum();
    let mut out = Vec::with_capacity(jpeg.len() + extra);
    out.extend_from_slice(&jpeg[..insert_at]);
    for segment in segments {
        if !segment.write_to(&mut out) {
            warn!(
                marker = segment.marker,
                bytes = segment.payload.len(),
                "metadata segment too large for JPEG, skipped"
            );
        }
    }
    out.extend_from_slice(&jpeg[insert_at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SOI, APP0 (JFIF stub), APP1 (Exif), APP13, DQT stub, SOS, data, EOI.
    fn synthetic_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, SOI];
        // APP0, length 7 → 5 payload bytes
        data.extend_from_slice(&[0xFF, APP0, 0x00, 0x07]);
        data.extend_from_slice(b"JFIF\0");
        // APP1 Exif, length 10 → 8 payload bytes
        data.extend_from_slice(&[0xFF, APP1, 0x00, 0x0A]);
        data.extend_from_slice(b"Exif\0\0MM");
        // APP13, length 6 → 4 payload bytes
        data.extend_from_slice(&[0xFF, APP13, 0x00, 0x06]);
        data.extend_from_slice(b"8BIM");
        // DQT stub, length 3 → 1 payload byte
        data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x03, 0x00]);
        // SOS, then entropy data that contains a fake APP1 marker
        data.extend_from_slice(&[0xFF, SOS, 0x00, 0x02, 0xFF, APP1, 0x12, 0x34]);
        data.extend_from_slice(&[0xFF, EOI]);
        data
    }

    #[test]
    fn reads_app1_and_app13_only() {
        let segments = read_metadata_segments(&synthetic_jpeg());
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].marker, APP1);
        assert_eq!(segments[0].payload, b"Exif\0\0MM");
        assert!(segments[0].is_exif());
        assert_eq!(segments[1].marker, APP13);
        assert_eq!(segments[1].payload, b"8BIM");
        assert!(!segments[1].is_exif());
    }

    #[test]
    fn non_jpeg_has_no_segments() {
        assert!(read_metadata_segments(b"\x89PNG\r\n\x1a\n").is_empty());
        assert!(read_metadata_segments(&[]).is_empty());
    }

    #[test]
    fn truncated_segment_stops_the_walk() {
        let data = [0xFF, SOI, 0xFF, APP1, 0x00, 0x40, b'E', b'x'];
        assert!(read_metadata_segments(&data).is_empty());
    }

    #[test]
    fn insert_skips_oversized_segment() {
        let encoded = [0xFF, SOI, 0xFF, 0xDB, 0x00, 0x03, 0x00, 0xFF, EOI];
        let small = MetadataSegment {
            marker: COM,
            payload: b"kept".to_vec(),
        };
        let oversized = MetadataSegment {
            marker: APP1,
            payload: vec![0; MAX_PAYLOAD + 1],
        };
        let out = insert_metadata_segments(&encoded, &[oversized, small.clone()]);

        assert_eq!(out.len(), encoded.len() + small.payload.len() + 4);
        assert_eq!(read_metadata_segments(&out), vec![small]);
    }

    #[test]
    fn insert_accepts_largest_payload() {
        let encoded = [0xFF, SOI, 0xFF, EOI];
        let largest = MetadataSegment {
            marker: APP13,
            payload: vec![7; MAX_PAYLOAD],
        };
        let out = insert_metadata_segments(&encoded, std::slice::from_ref(&largest));
        assert_eq!(&out[4..6], &[0xFF, 0xFF]);
        assert_eq!(out.len(), encoded.len() + MAX_PAYLOAD + 4);
    }

    #[test]
    fn insert_goes_after_jfif_header() {
        let encoded = {
            let mut d = vec![0xFF, SOI, 0xFF, APP0, 0x00, 0x07];
            d.extend_from_slice(b"JFIF\0");
            d.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x03, 0x00, 0xFF, EOI]);
            d
        };
        let segment = MetadataSegment {
            marker: APP1,
            payload: b"Exif\0\0II".to_vec(),
        };
        let out = insert_metadata_segments(&encoded, std::slice::from_ref(&segment));

        assert_eq!(out.len(), encoded.len() + segment.payload.len() + 4);
        // JFIF still first, our segment right after it
        assert_eq!(&out[2..4], &[0xFF, APP0]);
        assert_eq!(&out[11..13], &[0xFF, APP1]);
        assert_eq!(read_metadata_segments(&out), vec![segment]);
    }

    #[test]
    fn insert_roundtrips_segments_from_another_file() {
        let source = read_metadata_segments(&synthetic_jpeg());
        let bare = [0xFF, SOI, 0xFF, 0xDB, 0x00, 0x03, 0x00, 0xFF, EOI];
        let out = insert_metadata_segments(&bare, &source);
        assert_eq!(&out[..2], &[0xFF, SOI]);
        assert_eq!(read_metadata_segments(&out), source);
    }

    #[test]
    fn insert_into_non_jpeg_is_noop() {
        let segment = MetadataSegment {
            marker: COM,
            payload: b"hello".to_vec(),
        };
        let png = b"\x89PNG\r\n\x1a\n".to_vec();
        assert_eq!(insert_metadata_segments(&png, &[segment]), png);
    }
}
