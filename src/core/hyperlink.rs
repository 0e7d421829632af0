//! OSC 8 hyperlink registry
//!
//! Cells store only a numeric id; the registry owns the URIs. Links opened
//! with an explicit `id=` parameter reuse one registry entry per (id, uri)
//! pair so a logically-single link spanning many cells stays one entry.
//! Each screen buffer owns its own registry, so ids never alias across the
//! primary/alternate split.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One registered hyperlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub uri: String,
    /// The application-supplied `id=` parameter, if any.
    pub id_param: Option<String>,
}

/// Registry of hyperlinks for one screen buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperlinkRegistry {
    links: HashMap<u32, Hyperlink>,
    by_key: HashMap<(String, String), u32>,
    next_id: u32,
}

impl HyperlinkRegistry {
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
            by_key: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a link, reusing the entry for a repeated (id=, uri) pair.
    pub fn open(&mut self, id_param: Option<&str>, uri: &str) -> u32 {
        if let Some(param) = id_param {
            let key = (param.to_string(), uri.to_string());
            if let Some(&id) = self.by_key.get(&key) {
                return id;
            }
            let id = self.allocate();
            self.links.insert(
                id,
                Hyperlink {
                    uri: uri.to_string(),
                    id_param: Some(param.to_string()),
                },
            );
            self.by_key.insert(key, id);
            return id;
        }

        let id = self.allocate();
        self.links.insert(
            id,
            Hyperlink {
                uri: uri.to_string(),
                id_param: None,
            },
        );
        id
    }

    pub fn get(&self, id: u32) -> Option<&Hyperlink> {
        if id == 0 {
            return None;
        }
        self.links.get(&id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
        self.by_key.clear();
        self.next_id = 1;
    }

    /// Drop every link whose id is not in `live`. Called from maintenance
    /// points, never from the write path.
    pub fn retain_ids(&mut self, live: &std::collections::HashSet<u32>) {
        self.links.retain(|id, _| live.contains(id));
        let links = &self.links;
        self.by_key.retain(|_, id| links.contains_key(id));
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }
}
