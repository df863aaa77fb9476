//! Property-based tests for the listener registry
//!
//! Any interleaving of registrations and (possibly repeated) unregistrations
//! leaves each note's listener count equal to registered minus unregistered.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use uuid::Uuid;

use notestream::backend::realtime::{ListenerSink, ResourceId, SinkError, StreamBroadcaster};
use notestream::shared::StreamEvent;

struct NullSink;

impl ListenerSink for NullSink {
    fn send(&self, _event: &StreamEvent) -> Result<(), SinkError> {
        Ok(())
    }

    fn close(&self) {}
}

#[derive(Debug, Clone)]
enum Op {
    Register(u8),
    Unregister(usize),
    Broadcast(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3).prop_map(Op::Register),
        any::<usize>().prop_map(Op::Unregister),
        (0u8..3).prop_map(Op::Broadcast),
    ]
}

fn note(i: u8) -> ResourceId {
    ResourceId::new(format!("note-{i}"))
}

proptest! {
    #[test]
    fn test_count_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        let broadcaster = StreamBroadcaster::new();
        let mut handles = Vec::new();
        let mut live: HashMap<u8, usize> = HashMap::new();
        let mut removed = Vec::new();

        for op in ops {
            match op {
                Op::Register(i) => {
                    handles.push((i, broadcaster.register_listener(note(i), Arc::new(NullSink), Uuid::new_v4())));
                    *live.entry(i).or_default() += 1;
                }
                Op::Unregister(pick) if !handles.is_empty() => {
                    let idx = pick % handles.len();
                    let (i, handle) = &handles[idx];
                    let was_live = !removed.contains(&idx);
                    prop_assert_eq!(broadcaster.unregister_listener(handle), was_live);
                    if was_live {
                        removed.push(idx);
                        *live.entry(*i).or_default() -= 1;
                    }
                }
                Op::Unregister(_) => {}
                Op::Broadcast(i) => {
                    let expected = live.get(&i).copied().unwrap_or(0);
                    prop_assert_eq!(broadcaster.broadcast(&note(i), &StreamEvent::chunk("x")), expected);
                }
            }

            for i in 0u8..3 {
                prop_assert_eq!(broadcaster.listener_count(&note(i)), live.get(&i).copied().unwrap_or(0));
            }
            prop_assert_eq!(broadcaster.stats().total_listeners, live.values().sum::<usize>());
        }
    }
}
