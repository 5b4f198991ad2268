use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Capture format used by the device firmware: 16 kHz, 16-bit, mono.
pub const SAMPLE_RATE: u32 = 16_000;
pub const CHANNELS: u16 = 1;

const BITS_PER_SAMPLE: u16 = 16;

/// Wrap raw little-endian 16-bit PCM in a minimal RIFF WAVE container.
///
/// Produces the fixed 44-byte header (uncompressed PCM, no extension
/// chunks) followed by the payload verbatim. Pure and total: an empty
/// payload yields a header-only 44-byte container.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let byte_rate = sample_rate * channels as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let block_align = channels * (BITS_PER_SAMPLE / 8);

    let mut wav = Vec::with_capacity(44 + pcm.len());

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);

    wav
}

/// Decode the base64 transport encoding the firmware applies to PCM buffers.
pub fn decode_pcm_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn le_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn test_output_length_is_payload_plus_header() {
        for len in [0usize, 2, 4, 320, 32000] {
            let pcm = vec![0u8; len];
            let wav = pcm_to_wav(&pcm, SAMPLE_RATE, CHANNELS);
            assert_eq!(wav.len(), len + 44);
        }
    }

    #[test]
    fn test_chunk_markers() {
        let wav = pcm_to_wav(&[0u8; 640], SAMPLE_RATE, CHANNELS);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
    }

    #[test]
    fn test_size_fields() {
        let pcm = vec![0xAB; 1000];
        let wav = pcm_to_wav(&pcm, SAMPLE_RATE, CHANNELS);
        assert_eq!(le_u32(&wav, 4), 36 + 1000);
        assert_eq!(le_u32(&wav, 40), 1000);
    }

    #[test]
    fn test_fmt_chunk_fields() {
        let wav = pcm_to_wav(&[0u8; 4], 24_000, 2);
        assert_eq!(le_u32(&wav, 16), 16); // fmt chunk size
        assert_eq!(le_u16(&wav, 20), 1); // PCM
        assert_eq!(le_u16(&wav, 22), 2);
        assert_eq!(le_u32(&wav, 24), 24_000);
        assert_eq!(le_u32(&wav, 28), 24_000 * 2 * 2); // byte rate
        assert_eq!(le_u16(&wav, 32), 4); // block align
        assert_eq!(le_u16(&wav, 34), 16);
    }

    #[test]
    fn test_payload_copied_verbatim() {
        let pcm: Vec<u8> = (0..=255).collect();
        let wav = pcm_to_wav(&pcm, SAMPLE_RATE, CHANNELS);
        assert_eq!(&wav[44..], &pcm[..]);
    }

    #[test]
    fn test_four_byte_payload_with_defaults() {
        let wav = pcm_to_wav(&[0x01, 0x02, 0x03, 0x04], SAMPLE_RATE, CHANNELS);
        assert_eq!(wav.len(), 48);
        assert_eq!(le_u32(&wav, 4), 40);
        assert_eq!(le_u32(&wav, 24), 16_000);
        assert_eq!(le_u32(&wav, 28), 32_000);
        assert_eq!(le_u16(&wav, 32), 2);
        assert_eq!(le_u32(&wav, 40), 4);
        assert_eq!(&wav[44..48], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_empty_payload_yields_header_only_container() {
        let wav = pcm_to_wav(&[], SAMPLE_RATE, CHANNELS);
        assert_eq!(wav.len(), 44);
        assert_eq!(le_u32(&wav, 4), 36);
        assert_eq!(le_u32(&wav, 40), 0);
    }

    #[test]
    fn test_decode_pcm_base64() {
        assert_eq!(decode_pcm_base64("AQIDBA==").unwrap(), vec![1, 2, 3, 4]);
        assert!(decode_pcm_base64("not base64!").is_err());
    }
}
