//! The nine user-visible bulk transformations, built atop the geometry,
//! codec, planner and merge layers.

pub mod clone;
pub mod deleteblocks;
pub mod deletemeta;
pub mod deleteobjects;
pub mod deletetimers;
pub mod fill;
pub mod overlay;
pub mod replaceininv;
pub mod replacenodes;
pub mod setmetavar;
pub mod setparam2;

use regex::Regex;

use crate::error::{ConfigError, MapEditError};
use crate::geometry::{Area, Vec3};
use crate::mapblock::NameIdMap;
use crate::progress::ProgressObserver;
use crate::store::SqliteStore;

/// Holds the store handles, warning/confirmation state and progress
/// reporting shared by every command.
pub struct Instance<P: ProgressObserver> {
    pub db: SqliteStore,
    pub sdb: Option<SqliteStore>,
    pub print_warnings: bool,
    progress: P,
}

const STANDARD_WARNING: &str = "This tool can permanently damage your Minetest world.\n\
Always EXIT Minetest and BACK UP the map database before use.";

impl<P: ProgressObserver> Instance<P> {
    pub fn new(db: SqliteStore, sdb: Option<SqliteStore>, print_warnings: bool, progress: P) -> Self {
        Instance { db, sdb, print_warnings, progress }
    }

    pub fn info(&self, msg: &str) {
        for line in msg.lines() {
            log::info!("{line}");
        }
    }

    pub fn warn(&self, msg: &str) {
        if self.print_warnings {
            for line in msg.lines() {
                log::warn!("{line}");
            }
        }
    }

    /// Logs `msg` at error level and turns it into a fatal
    /// [`MapEditError`], for a command to return via `?`/`return Err(...)`.
    pub fn fatal(&self, msg: impl Into<String>) -> MapEditError {
        let msg = msg.into();
        log::error!("{msg}");
        MapEditError::Config(ConfigError::InvalidArgument(msg))
    }

    /// Prints the standard damage warning and, unless suppressed, blocks on
    /// a y/n confirmation read from stdin. Starts the progress clock
    /// regardless.
    pub fn begin(&mut self) -> Result<(), MapEditError> {
        if self.print_warnings {
            self.warn(STANDARD_WARNING);
            print!("Proceed? (Y/n): ");
            let _ = std::io::Write::flush(&mut std::io::stdout());
            let mut answer = String::new();
            std::io::stdin()
                .read_line(&mut answer)
                .map_err(crate::error::MapblockError::Read)?;
            if !answer.trim().eq_ignore_ascii_case("y") {
                return Err(ConfigError::Cancelled.into());
            }
        }
        self.progress.start();
        Ok(())
    }

    pub fn update_progress(&mut self, completed: usize, total: usize) {
        self.progress.update(completed, total);
    }

    pub fn finish(&mut self) {
        self.progress.finish();
    }
}

/// Node/item name syntax: `name:space` style, with `air` (and, only for a
/// replace-item target, `Empty`) as the accepted exceptions.
pub fn validate_name(value: &str, allow_empty: bool) -> Result<(), ConfigError> {
    if value == "air" || (allow_empty && value == "Empty") {
        return Ok(());
    }
    let pattern = Regex::new(r"^[a-zA-Z0-9_]+:[a-zA-Z0-9_]+$").expect("static pattern is valid");
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(value.to_string()))
    }
}

/// Looks up `name`'s content id in `nimap`, if present.
pub fn lookup_content_id(nimap: &NameIdMap, name: &[u8]) -> Option<u16> {
    nimap.iter().position(|n| n.as_slice() == name).map(|i| i as u16)
}

/// Whether a block-relative position (given as a 16-bit intra-block key)
/// falls within the command's selection: always true with no `area`;
/// otherwise the usual inclusive containment, negated when `invert` is set.
pub fn pos_selected(area: Option<Area>, invert: bool, block_corner: Vec3, pos_key: u16) -> bool {
    match area {
        Some(area) => area.contains(block_corner + Vec3::from_u16_key(pos_key)) != invert,
        None => true,
    }
}

/// Logs and `continue`s the enclosing loop when `$result` is an `Err`,
/// otherwise evaluates to the `Ok` value. Implements the "log and skip"
/// per-block error policy for codec failures encountered mid-iteration.
macro_rules! skip_on_error {
    ($result:expr, $key:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => {
                log::warn!("mapblock {}: {}", $key, err);
                continue;
            }
        }
    };
}
pub(crate) use skip_on_error;

/// Rounds `n / 16` to the nearest integer, ties to even — matching Python's
/// `round()`, which both `clone --blockmode` and `overlay --blockmode` use
/// to snap a node offset to a whole mapblock.
pub(crate) fn round_to_block(n: i32) -> i32 {
    use num_integer::Integer;
    use std::cmp::Ordering;

    let (q, r) = n.div_mod_floor(&16);
    match r.cmp(&8) {
        Ordering::Less => q,
        Ordering::Greater => q + 1,
        Ordering::Equal => {
            if q % 2 == 0 {
                q
            } else {
                q + 1
            }
        }
    }
}
