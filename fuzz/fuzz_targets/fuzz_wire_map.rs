#![no_main]

use libfuzzer_sys::fuzz_target;
use qdraw_core::{WireMap, WireMapError};

fuzz_target!(|pairs: Vec<(u16, u8)>| {
    if pairs.len() > 256 {
        return;
    }
    let pairs: Vec<(u16, usize)> = pairs
        .into_iter()
        .map(|(label, index)| (label, usize::from(index)))
        .collect();

    match WireMap::from_indices(pairs.clone()) {
        Ok(map) => {
            // A valid map is a dense bijection.
            assert_eq!(map.len(), pairs.len());
            for (label, index) in &pairs {
                assert_eq!(map.index_of(label), Ok(*index));
                assert_eq!(map.label_at(*index), Some(label));
            }
        }
        Err(
            WireMapError::DuplicateWire { .. }
            | WireMapError::IndexOutOfRange { .. }
            | WireMapError::IndexCollision { .. },
        ) => {}
        Err(err @ WireMapError::UnknownWire { .. }) => {
            panic!("construction never reports lookups: {err}");
        }
    }
});
