use nom::error::{Error, ErrorKind};
use nom::{IResult, bytes, number};

/// Longest legal variable-length quantity encoding.
pub const MAX_VARLEN_BYTES: usize = 4;

/// Largest value a variable-length quantity can carry.
pub const MAX_VARLEN_VALUE: u32 = 0x0FFF_FFFF;

/// Parse unsigned byte
pub fn parse_u8(i: &[u8]) -> IResult<&[u8], u8> {
    number::complete::u8(i)
}

/// Parse big-endian unsigned short
pub fn parse_u16_be(i: &[u8]) -> IResult<&[u8], u16> {
    number::complete::be_u16(i)
}

/// Parse big-endian unsigned 32
pub fn parse_u32_be(i: &[u8]) -> IResult<&[u8], u32> {
    number::complete::be_u32(i)
}

/// Take exactly `n` bytes.
pub fn take_bytes(i: &[u8], n: usize) -> IResult<&[u8], &[u8]> {
    bytes::complete::take(n)(i)
}

/// Parse a MIDI variable-length quantity: 7 bits per byte, the MSB of each
/// byte except the last is a continuation flag.
pub fn parse_varlen(i: &[u8]) -> IResult<&[u8], u32> {
    let mut value: u32 = 0;
    for index in 0..MAX_VARLEN_BYTES {
        let Some(byte) = i.get(index) else {
            return Err(nom::Err::Error(Error::new(i, ErrorKind::Eof)));
        };
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((&i[index + 1..], value));
        }
    }
    // no terminating byte within 4 bytes
    Err(nom::Err::Error(Error::new(i, ErrorKind::TooLarge)))
}

/// Encode a value as a variable-length quantity.
/// Values above [`MAX_VARLEN_VALUE`] do not fit and are truncated modulo 2^28.
pub fn encode_varlen(value: u32) -> Vec<u8> {
    let mut value = value & MAX_VARLEN_VALUE;
    let mut encoded = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        encoded.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    encoded.reverse();
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_varlen_single_byte() {
        let (rest, value) = parse_varlen(&[0x00]).unwrap();
        assert_eq!(value, 0);
        assert!(rest.is_empty());

        let (rest, value) = parse_varlen(&[0x7F, 0xAA]).unwrap();
        assert_eq!(value, 127);
        assert_eq!(rest, &[0xAA]);
    }

    #[test]
    fn test_parse_varlen_multi_byte() {
        // examples from the SMF specification
        let (_, value) = parse_varlen(&[0x81, 0x00]).unwrap();
        assert_eq!(value, 0x80);
        let (_, value) = parse_varlen(&[0xC0, 0x00]).unwrap();
        assert_eq!(value, 0x2000);
        let (_, value) = parse_varlen(&[0xFF, 0xFF, 0xFF, 0x7F]).unwrap();
        assert_eq!(value, MAX_VARLEN_VALUE);
    }

    #[test]
    fn test_parse_varlen_unterminated() {
        assert!(parse_varlen(&[]).is_err());
        assert!(parse_varlen(&[0x80]).is_err());
        assert!(parse_varlen(&[0xFF, 0xFF, 0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_varlen_round_trip() {
        let boundaries = [
            0u32, 1, 0x7F, 0x80, 0x3FFF, 0x4000, 0x001F_FFFF, 0x0020_0000, MAX_VARLEN_VALUE,
        ];
        for value in boundaries {
            let encoded = encode_varlen(value);
            let (rest, decoded) = parse_varlen(&encoded).unwrap();
            assert_eq!(decoded, value);
            assert!(rest.is_empty(), "whole encoding consumed for {value}");
        }
        // sweep the domain with a coarse stride
        for value in (0..=MAX_VARLEN_VALUE).step_by(65_537) {
            let encoded = encode_varlen(value);
            assert!(encoded.len() <= MAX_VARLEN_BYTES);
            let (rest, decoded) = parse_varlen(&encoded).unwrap();
            assert_eq!(decoded, value);
            assert!(rest.is_empty());
        }
    }
}
