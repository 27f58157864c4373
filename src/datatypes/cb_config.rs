// ABOUTME: Cell broadcast configuration: enable flag, id selection and the ordered id list
// ABOUTME: Parses and renders the message identifier lists used by +CSCB

/// Upper bound on the number of message identifiers a configuration may hold
pub const MAX_CB_IDS: usize = 100;

/// Which broadcast message identifiers are accepted
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CbSelection {
    #[default]
    None,
    Some,
    All,
}

/// Cell broadcast configuration.
///
/// `msg_ids` keeps insertion order, which is the priority order. It is
/// ignored for `All`, and `None` means broadcast reception is off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CbConfig {
    pub enabled: bool,
    pub selection: CbSelection,
    pub msg_ids: Vec<u16>,
    pub max_id_count: usize,
}

impl Default for CbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            selection: CbSelection::None,
            msg_ids: Vec::new(),
            max_id_count: MAX_CB_IDS,
        }
    }
}

impl CbConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            enabled: true,
            selection: CbSelection::All,
            ..Default::default()
        }
    }

    pub fn some(ids: impl IntoIterator<Item = u16>) -> Self {
        Self {
            enabled: true,
            selection: CbSelection::Some,
            msg_ids: ids.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Whether the configuration leaves broadcast reception switched off
    pub fn is_off(&self) -> bool {
        !self.enabled || self.selection == CbSelection::None
    }

    /// Renders the id list as `+CSCB` expects it, e.g. `1,2,3`
    pub fn mids_string(&self) -> String {
        self.msg_ids
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parses a `<mids>` field such as `1,2,3`, `(1,2,3)` or `0-5,50`.
///
/// Ranges are expanded, duplicates dropped and the result capped at
/// `limit` entries. Returns `None` when any element is not a number.
pub fn parse_mids(field: &str, limit: usize) -> Option<Vec<u16>> {
    let field = field
        .trim()
        .trim_start_matches(['(', '"'])
        .trim_end_matches([')', '"']);

    let mut ids: Vec<u16> = Vec::new();
    let push = |id: u16, ids: &mut Vec<u16>| {
        if ids.len() < limit && !ids.contains(&id) {
            ids.push(id);
        }
    };

    for part in field.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: u16 = start.trim().parse().ok()?;
                let end: u16 = end.trim().parse().ok()?;
                for id in start..=end {
                    if ids.len() >= limit {
                        break;
                    }
                    push(id, &mut ids);
                }
            }
            None => push(part.parse().ok()?, &mut ids),
        }
    }

    Some(ids)
}
