// crates/gatekit-store/src/id_list_manager.rs
// ============================================================================
// Module: Gatekit Id-List Manager
// Description: Directory sync, incremental byte-range fetch, and patch
// application for id lists.
// Purpose: §4.D "Id-list manager".
// Dependencies: gatekit-core, std::thread
// ============================================================================

//! ## Overview
//! The directory (`Transport::get_id_lists`) tells the manager which lists
//! exist, their current `size`/`fileID`/`creationTime`/`url`. For each list
//! already held, a `fileID` change resets the list only if the directory's
//! `creationTime` is not older than what's held (§4.D "reset semantics");
//! otherwise the manager fetches the delta from `size` onward. Per-list
//! fetches run in parallel via [`std::thread::scope`] since `Transport` is
//! `Send + Sync` and lists are independent.

use std::collections::BTreeMap;

use gatekit_core::interfaces::Transport;
use gatekit_core::spec::IdList;
use gatekit_core::spec::IdListDirectory;

/// Syncs `held` id lists against the directory and transport, returning the
/// updated map. Lists absent from the directory are dropped; lists whose
/// body comes back malformed (not valid UTF-8, empty, or not starting with
/// a `+`/`-` patch marker) are dropped rather than partially applied (§4.D
/// "corrupt body" rule).
pub fn sync_id_lists(
    transport: &dyn Transport,
    directory: &IdListDirectory,
    mut held: BTreeMap<String, IdList>,
) -> BTreeMap<String, IdList> {
    held.retain(|name, _| directory.contains_key(name));

    let names: Vec<&String> = directory.keys().collect();
    let results: Vec<(String, Option<IdList>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = names
            .into_iter()
            .map(|name| {
                let entry = &directory[name];
                let existing = held.remove(name);
                scope.spawn(move || (name.clone(), sync_one_list(transport, entry, existing)))
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap_or((String::new(), None))).collect()
    });

    let mut updated = BTreeMap::new();
    for (name, list) in results {
        if let Some(list) = list {
            updated.insert(name, list);
        }
    }
    updated
}

/// Syncs one id list: resets on a `fileID` change (when the directory's
/// `creationTime` is not older than what's held), then fetches the byte
/// range starting at the list's currently-consumed size.
fn sync_one_list(
    transport: &dyn Transport,
    entry: &gatekit_core::spec::IdListDirectoryEntry,
    existing: Option<IdList>,
) -> Option<IdList> {
    let mut list = match existing {
        Some(list) if list.file_id == entry.file_id => list,
        Some(list) if entry.creation_time < list.creation_time => {
            // Directory reports an older generation than what's held; keep
            // holding the current list rather than regressing it.
            return Some(list);
        }
        Some(mut list) => {
            list.reset(entry.url.clone(), entry.file_id.clone(), entry.creation_time);
            list
        }
        None => IdList::new(entry.name.clone(), entry.url.clone(), entry.file_id.clone(), entry.creation_time),
    };

    let range_start = consumed_bytes(&list, entry);
    if range_start >= entry.size {
        return Some(list);
    }

    match transport.get_id_list(&entry.url, range_start) {
        Ok(bytes) => {
            let starts_with_patch_marker = matches!(bytes.first(), Some(b'+') | Some(b'-'));
            if !starts_with_patch_marker {
                tracing::warn!(list = %entry.name, "id list body was empty or malformed; dropping list");
                return None;
            }
            match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    apply_patch_body(&mut list, text);
                    Some(list)
                }
                Err(_) => {
                    tracing::warn!(list = %entry.name, "id list body was not valid utf-8; dropping list");
                    None
                }
            }
        }
        Err(err) => {
            tracing::warn!(list = %entry.name, error = %err, "id list fetch failed; keeping prior state");
            Some(list)
        }
    }
}

/// Applies every `+`/`-` line in `body` to `list`, tracking consumed bytes
/// so the next sync resumes from this offset (§4.D).
fn apply_patch_body(list: &mut IdList, body: &str) {
    for line in body.lines() {
        if line.is_empty() {
            continue;
        }
        list.apply_patch_line(line);
        list.add_consumed_bytes(line.len() as u64 + 1);
    }
}

/// The byte offset to resume fetching from: everything already folded into
/// `list.size`, capped at what the directory currently reports.
fn consumed_bytes(list: &IdList, entry: &gatekit_core::spec::IdListDirectoryEntry) -> u64 {
    list.size.min(entry.size)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use gatekit_core::interfaces::TransportError;
    use gatekit_core::spec::IdListDirectoryEntry;
    use gatekit_core::spec::WireSpecPayload;

    use super::*;

    struct FakeTransport {
        bodies: Mutex<BTreeMap<String, Vec<u8>>>,
    }

    impl Transport for FakeTransport {
        fn download_config_specs(&self, _since_time: i64) -> Result<WireSpecPayload, TransportError> {
            unimplemented!("not exercised by these tests")
        }

        fn get_id_lists(&self) -> Result<IdListDirectory, TransportError> {
            unimplemented!("not exercised by these tests")
        }

        fn get_id_list(&self, url: &str, range_start: u64) -> Result<Vec<u8>, TransportError> {
            let bodies = self.bodies.lock().expect("lock");
            let full = bodies.get(url).cloned().unwrap_or_default();
            Ok(full.get(range_start as usize..).unwrap_or_default().to_vec())
        }

        fn post(&self, _path: &str, _body: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn fresh_list_is_fully_fetched() {
        let mut bodies = BTreeMap::new();
        bodies.insert("http://lists/a".to_string(), b"+alice\n+bob\n".to_vec());
        let transport = FakeTransport { bodies: Mutex::new(bodies) };

        let mut directory = IdListDirectory::new();
        directory.insert(
            "list_a".to_string(),
            IdListDirectoryEntry { name: "list_a".to_string(), size: 12, url: "http://lists/a".to_string(), creation_time: 1, file_id: "f1".to_string() },
        );

        let updated = sync_id_lists(&transport, &directory, BTreeMap::new());
        let list = updated.get("list_a").expect("list present");
        assert_eq!(list.member_count(), 2);
    }

    #[test]
    fn list_missing_from_directory_is_dropped() {
        let transport = FakeTransport { bodies: Mutex::new(BTreeMap::new()) };
        let mut held = BTreeMap::new();
        held.insert("stale".to_string(), IdList::new("stale".to_string(), "u".to_string(), "f".to_string(), 1));
        let updated = sync_id_lists(&transport, &IdListDirectory::new(), held);
        assert!(updated.is_empty());
    }
}
