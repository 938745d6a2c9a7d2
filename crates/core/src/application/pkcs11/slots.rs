// softhsm2-util --show-slots report parsing

use crate::domain::SlotId;
use regex::Regex;
use std::sync::LazyLock;

// Report shape:
//
// Available slots:
// Slot 0
//     Slot info:
//         ...
//         Token present:    yes
//     Token info:
//         ...
//         Initialized:      yes
static SLOT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Slot ([0-9]+)").expect("slot header regex"));
static INFO_BLOCK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^    ([^ ].*)").expect("info block regex"));
static INITIALIZED_YES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *Initialized: *yes").expect("initialized regex"));

const TOKEN_INFO_BLOCK: &str = "Token info";

/// Return the slots holding an initialized token, in report order
///
/// A slot counts only when `Initialized: yes` appears inside its
/// `Token info` block. Slot numbers too large for u64 are skipped along
/// with the rest of their block.
pub fn parse_initialized_slots(report: &str) -> Vec<SlotId> {
    let mut slots = Vec::new();
    let mut current_slot: Option<SlotId> = None;
    let mut current_block: Option<&str> = None;

    for line in report.lines() {
        if let Some(caps) = SLOT_HEADER.captures(line) {
            current_slot = caps[1].parse().ok();
            current_block = None;
            continue;
        }

        let Some(slot) = current_slot else {
            continue;
        };

        if let Some(caps) = INFO_BLOCK_HEADER.captures(line) {
            current_block = caps.get(1).map(|m| m.as_str());
            continue;
        }

        let Some(block) = current_block else {
            continue;
        };

        if block.contains(TOKEN_INFO_BLOCK)
            && INITIALIZED_YES.is_match(line)
            && !slots.contains(&slot)
        {
            slots.push(slot);
        }
    }

    slots
}
