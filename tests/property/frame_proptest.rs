//! Property-based tests for SSE framing

use proptest::prelude::*;

use notestream::backend::realtime::{decode_frames, encode_event, FrameDecoder, HEARTBEAT_FRAME};
use notestream::shared::StreamEvent;

proptest! {
    #[test]
    fn test_any_chunk_text_is_one_frame(text in any::<String>()) {
        let frame = encode_event(&StreamEvent::chunk(text.clone())).unwrap();
        let frame = std::str::from_utf8(&frame).unwrap();

        // exactly one blank-line terminator
        prop_assert_eq!(frame.matches("\n\n").count(), 1);
        prop_assert!(frame.ends_with("\n\n"));

        let events = decode_frames(frame).unwrap();
        prop_assert_eq!(events.len(), 1);
        prop_assert_eq!(events[0].data.as_deref(), Some(text.as_str()));
    }

    #[test]
    fn test_heartbeats_never_add_events(
        texts in prop::collection::vec(".{0,16}", 1..8),
        split in any::<prop::sample::Index>(),
    ) {
        let heartbeat = std::str::from_utf8(HEARTBEAT_FRAME).unwrap();
        let mut body = String::from(heartbeat);
        for text in &texts {
            let frame = encode_event(&StreamEvent::chunk(text.clone())).unwrap();
            body.push_str(std::str::from_utf8(&frame).unwrap());
            body.push_str(heartbeat);
        }

        // feed in two arbitrary pieces split on a char boundary
        let boundaries: Vec<usize> = body.char_indices().map(|(i, _)| i).collect();
        let at = boundaries[split.index(boundaries.len())];
        let mut decoder = FrameDecoder::new();
        let mut events = decoder.push(&body[..at]).unwrap();
        events.extend(decoder.push(&body[at..]).unwrap());

        prop_assert_eq!(events.len(), texts.len());
        prop_assert!(decoder.pending().is_empty());
    }

    #[test]
    fn test_crlf_stream_decodes_across_any_split(
        texts in prop::collection::vec(".{0,16}", 1..8),
        split in any::<prop::sample::Index>(),
    ) {
        let mut body = String::new();
        for text in &texts {
            let frame = encode_event(&StreamEvent::chunk(text.clone())).unwrap();
            body.push_str(std::str::from_utf8(&frame).unwrap());
            body.push_str(std::str::from_utf8(HEARTBEAT_FRAME).unwrap());
        }
        let body = body.replace('\n', "\r\n");

        // includes splits between the `\r` and `\n` of a pair
        let boundaries: Vec<usize> = body.char_indices().map(|(i, _)| i).collect();
        let at = boundaries[split.index(boundaries.len())];
        let mut decoder = FrameDecoder::new();
        let mut events = decoder.push(&body[..at]).unwrap();
        events.extend(decoder.push(&body[at..]).unwrap());

        let decoded: Vec<_> = events.iter().map(|e| e.data.clone().unwrap_or_default()).collect();
        prop_assert_eq!(decoded, texts);
        prop_assert!(decoder.pending().is_empty());
    }
}
