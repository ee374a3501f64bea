//! Command-line surface: global flags, the nine subcommands, and the
//! pre-dispatch name/area validation pass described in §6.3/§10.3.

use clap::{Parser, Subcommand};

use crate::error::ConfigError;
use crate::geometry::{Area, Vec3};

/// Offline bulk editor for a voxel-sandbox-game world database.
#[derive(Parser, Debug)]
#[command(name = "mapedit", author, version, about)]
pub struct Cli {
    /// Primary world database file.
    #[arg(short = 'f', long = "file")]
    pub file: String,

    /// Skip the damage warning and confirmation prompt.
    #[arg(long = "no-warnings")]
    pub no_warnings: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clone the given area to a new location.
    Clone {
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Vec<i32>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Vec<i32>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        offset: Vec<i32>,
        #[arg(long)]
        blockmode: bool,
    },

    /// Copy part or all of a secondary world file into the primary one.
    Overlay {
        /// Secondary world database file.
        #[arg(short = 's', long = "input-file")]
        input_file: String,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Option<Vec<i32>>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Option<Vec<i32>>,
        #[arg(long)]
        invert: bool,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        offset: Option<Vec<i32>>,
        #[arg(long)]
        blockmode: bool,
    },

    /// Delete all mapblocks in the given area.
    Deleteblocks {
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Vec<i32>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Vec<i32>,
        #[arg(long)]
        invert: bool,
    },

    /// Fill the given area with one node.
    Fill {
        replacenode: String,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Vec<i32>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Vec<i32>,
        #[arg(long)]
        invert: bool,
        #[arg(long)]
        blockmode: bool,
    },

    /// Replace all of one node with another node.
    Replacenodes {
        searchnode: String,
        replacenode: String,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Option<Vec<i32>>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Option<Vec<i32>>,
        #[arg(long)]
        invert: bool,
    },

    /// Set param2 across a node selection and/or area.
    Setparam2 {
        paramval: i32,
        #[arg(long)]
        searchnode: Option<String>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Option<Vec<i32>>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Option<Vec<i32>>,
        #[arg(long)]
        invert: bool,
    },

    /// Delete node metadata matching a node and/or area.
    Deletemeta {
        #[arg(long)]
        searchnode: Option<String>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Option<Vec<i32>>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Option<Vec<i32>>,
        #[arg(long)]
        invert: bool,
    },

    /// Overwrite an existing node metadata variable.
    Setmetavar {
        metakey: String,
        metavalue: String,
        #[arg(long)]
        searchnode: Option<String>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Option<Vec<i32>>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Option<Vec<i32>>,
        #[arg(long)]
        invert: bool,
    },

    /// Replace an item inside node inventories.
    Replaceininv {
        searchitem: String,
        replaceitem: String,
        #[arg(long)]
        searchnode: Option<String>,
        #[arg(long)]
        deletemeta: bool,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Option<Vec<i32>>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Option<Vec<i32>>,
        #[arg(long)]
        invert: bool,
    },

    /// Delete node timers matching a node and/or area.
    Deletetimers {
        #[arg(long)]
        searchnode: Option<String>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Option<Vec<i32>>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Option<Vec<i32>>,
        #[arg(long)]
        invert: bool,
    },

    /// Delete static objects (entities, dropped items) matching a search.
    Deleteobjects {
        #[arg(long)]
        searchobj: Option<String>,
        #[arg(long)]
        items: bool,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p1: Option<Vec<i32>>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        p2: Option<Vec<i32>>,
        #[arg(long)]
        invert: bool,
    },
}

fn vec3_of(parts: &[i32]) -> Vec3 {
    Vec3::new(parts[0], parts[1], parts[2])
}

/// Converts a required `--offset`-style triple into a `Vec3`.
pub fn required_offset(offset: &[i32]) -> Vec3 {
    vec3_of(offset)
}

/// Builds an `Area` out of a required `--p1`/`--p2` pair.
pub fn required_area(p1: &[i32], p2: &[i32]) -> Area {
    Area::from_args(vec3_of(p1), vec3_of(p2))
}

/// Builds an `Area` out of an optional `--p1`/`--p2` pair, which must be
/// given together or not at all.
pub fn optional_area(p1: &Option<Vec<i32>>, p2: &Option<Vec<i32>>) -> Result<Option<Area>, ConfigError> {
    match (p1, p2) {
        (Some(p1), Some(p2)) => Ok(Some(Area::from_args(vec3_of(p1), vec3_of(p2)))),
        (None, None) => Ok(None),
        _ => Err(ConfigError::InvalidArgument(
            "--p1 and --p2 must be given together".into(),
        )),
    }
}

/// Converts an optional `--offset` triple into a `Vec3`, defaulting to zero.
pub fn offset_or_zero(offset: &Option<Vec<i32>>) -> Vec3 {
    offset.as_deref().map(vec3_of).unwrap_or(Vec3::new(0, 0, 0))
}

/// Validates every node/item name argument of `command` against the
/// name-syntax regex, before any store is opened.
///
/// Mirrors `_verify_and_run`'s early validation pass: a bad name is a
/// configuration error, never a per-block one.
pub fn validate_names(command: &Command) -> Result<(), ConfigError> {
    use crate::commands::validate_name;

    match command {
        Command::Clone { .. } | Command::Overlay { .. } | Command::Deleteblocks { .. } => Ok(()),
        Command::Fill { replacenode, .. } => validate_name(replacenode, false),
        Command::Replacenodes { searchnode, replacenode, .. } => {
            validate_name(searchnode, false)?;
            validate_name(replacenode, false)
        }
        Command::Setparam2 { searchnode, .. } => match searchnode {
            Some(n) => validate_name(n, false),
            None => Ok(()),
        },
        Command::Deletemeta { searchnode, .. } | Command::Deletetimers { searchnode, .. } => {
            match searchnode {
                Some(n) => validate_name(n, false),
                None => Ok(()),
            }
        }
        Command::Setmetavar { searchnode, .. } => match searchnode {
            Some(n) => validate_name(n, false),
            None => Ok(()),
        },
        Command::Replaceininv { searchnode, searchitem, replaceitem, .. } => {
            if let Some(n) = searchnode {
                validate_name(n, false)?;
            }
            validate_name(searchitem, false)?;
            validate_name(replaceitem, true)
        }
        Command::Deleteobjects { .. } => Ok(()),
    }
}
