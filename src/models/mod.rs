//! Data models for the appearance forwarder.
//!
//! - [`records`]: the plugin records that determine NPC appearance (NPCs, head parts,
//!   armor, armor addons, texture sets) and their identifiers ([`FormKey`], [`ModKey`])
//! - [`AssetPathSet`]: mesh and texture paths collected for one NPC
//! - [`ForwarderSettings`]: user settings loaded from `Forwarder Settings.yaml`

pub mod assets;
pub mod config;
pub mod records;

pub use assets::{AssetCategory, AssetPathSet};
pub use config::{ForwarderSettings, Mode, PluginForwardSelection};
pub use records::{
    Armor, ArmorAddon, FormKey, FormKeyParseError, GenderedItem, HeadPart, ModKey, Npc, Record,
    RecordKind, RemapTable, TextureSet,
};
