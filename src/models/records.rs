//! Record data model for the subset of plugin records that determine NPC appearance.
//!
//! Records are identified by a [`FormKey`] (local 24-bit id + owning plugin). References
//! between records are stored as plain `FormKey`s and resolved through a
//! [`LinkCache`](crate::services::LinkCache); a reference that does not resolve is not an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static FORM_KEY_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^(?P<id>[0-9A-Fa-f]{1,6}):(?P<plugin>.+\.(?i:esp|esm|esl))$")
        .expect("Invalid FormKey regex")
});

/// Table of old -> new FormKeys produced when records are duplicated into the patch.
pub type RemapTable = HashMap<FormKey, FormKey>;

/// Identifies a plugin by file name (e.g. `Skyrim.esm`).
///
/// Plugin names are case-insensitive, so equality and hashing ignore ASCII case while
/// `Display` keeps the name as written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModKey(String);

impl ModKey {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self(file_name.into())
    }

    /// The plugin file name as written in configuration.
    pub fn file_name(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ModKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for ModKey {}

impl Hash for ModKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for ModKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormKeyParseError {
    #[error("Invalid FormKey '{0}', expected <hex id>:<plugin file name>")]
    InvalidFormat(String),
}

/// Globally unique record identifier: local id plus the plugin that first defined the record.
///
/// Serialized as `"0A1B2C:Skyrim.esm"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormKey {
    id: u32,
    mod_key: ModKey,
}

impl FormKey {
    /// Only the low 24 bits of `id` are kept; the high byte is a load-order index
    /// and never part of a FormKey.
    pub fn new(id: u32, mod_key: ModKey) -> Self {
        Self {
            id: id & 0x00FF_FFFF,
            mod_key,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn mod_key(&self) -> &ModKey {
        &self.mod_key
    }

    /// Six upper-case hex digits, e.g. `000D62`.
    pub fn id_string(&self) -> String {
        format!("{:06X}", self.id)
    }
}

impl fmt::Display for FormKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_string(), self.mod_key)
    }
}

impl FromStr for FormKey {
    type Err = FormKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = FORM_KEY_PATTERN
            .captures(s.trim())
            .ok_or_else(|| FormKeyParseError::InvalidFormat(s.to_string()))?;

        let id = u32::from_str_radix(&captures["id"], 16)
            .map_err(|_| FormKeyParseError::InvalidFormat(s.to_string()))?;

        Ok(Self::new(id, ModKey::new(&captures["plugin"])))
    }
}

impl TryFrom<String> for FormKey {
    type Error = FormKeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FormKey> for String {
    fn from(value: FormKey) -> Self {
        value.to_string()
    }
}

/// A male/female pair of optional values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderedItem<T> {
    pub male: Option<T>,
    pub female: Option<T>,
}

impl<T> Default for GenderedItem<T> {
    fn default() -> Self {
        Self {
            male: None,
            female: None,
        }
    }
}

impl<T> GenderedItem<T> {
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.male.iter().chain(self.female.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub form_key: FormKey,
    #[serde(default)]
    pub editor_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub head_parts: Vec<FormKey>,
    #[serde(default)]
    pub worn_armor: Option<FormKey>,
}

impl Npc {
    /// `"<name> | <editor id> | <form key>"`, used in log output.
    pub fn display_string(&self) -> String {
        format!(
            "{} | {} | {}",
            self.name.as_deref().unwrap_or_default(),
            self.editor_id.as_deref().unwrap_or_default(),
            self.form_key
        )
    }

    /// Head parts, then worn armor.
    pub fn form_links(&self) -> Vec<FormKey> {
        self.head_parts
            .iter()
            .chain(self.worn_armor.iter())
            .cloned()
            .collect()
    }

    pub fn remap_links(&mut self, table: &RemapTable) -> usize {
        remap_all(self.head_parts.iter_mut().chain(self.worn_armor.iter_mut()), table)
    }
}

/// Rewrite every link found in `table`, returning how many changed.
fn remap_all<'a>(links: impl IntoIterator<Item = &'a mut FormKey>, table: &RemapTable) -> usize {
    let mut changed = 0;
    for link in links {
        if let Some(new_key) = table.get(link) {
            *link = new_key.clone();
            changed += 1;
        }
    }
    changed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadPart {
    pub form_key: FormKey,
    #[serde(default)]
    pub editor_id: Option<String>,
    /// Mesh file relative to `Meshes/`.
    #[serde(default)]
    pub model: Option<String>,
    /// Part file names (tri files and the like), relative to `Meshes/`.
    #[serde(default)]
    pub parts: Vec<String>,
    #[serde(default)]
    pub texture_set: Option<FormKey>,
    #[serde(default)]
    pub extra_parts: Vec<FormKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub form_key: FormKey,
    #[serde(default)]
    pub editor_id: Option<String>,
    #[serde(default)]
    pub armature: Vec<FormKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorAddon {
    pub form_key: FormKey,
    #[serde(default)]
    pub editor_id: Option<String>,
    #[serde(default)]
    pub world_model: GenderedItem<String>,
    #[serde(default)]
    pub skin_texture: GenderedItem<FormKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureSet {
    pub form_key: FormKey,
    #[serde(default)]
    pub editor_id: Option<String>,
    #[serde(default)]
    pub diffuse: Option<String>,
    #[serde(default)]
    pub normal_or_gloss: Option<String>,
    #[serde(default)]
    pub backlight_mask_or_specular: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub environment_mask_or_subsurface_tint: Option<String>,
    #[serde(default)]
    pub glow_or_detail_map: Option<String>,
}

impl TextureSet {
    /// The six texture slots in record order.
    pub fn slots(&self) -> [Option<&str>; 6] {
        [
            self.diffuse.as_deref(),
            self.normal_or_gloss.as_deref(),
            self.backlight_mask_or_specular.as_deref(),
            self.environment.as_deref(),
            self.environment_mask_or_subsurface_tint.as_deref(),
            self.glow_or_detail_map.as_deref(),
        ]
    }
}

/// Any record kind this tool understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    Npc(Npc),
    HeadPart(HeadPart),
    Armor(Armor),
    ArmorAddon(ArmorAddon),
    TextureSet(TextureSet),
}

impl Record {
    pub fn form_key(&self) -> &FormKey {
        match self {
            Record::Npc(r) => &r.form_key,
            Record::HeadPart(r) => &r.form_key,
            Record::Armor(r) => &r.form_key,
            Record::ArmorAddon(r) => &r.form_key,
            Record::TextureSet(r) => &r.form_key,
        }
    }

    pub fn set_form_key(&mut self, form_key: FormKey) {
        match self {
            Record::Npc(r) => r.form_key = form_key,
            Record::HeadPart(r) => r.form_key = form_key,
            Record::Armor(r) => r.form_key = form_key,
            Record::ArmorAddon(r) => r.form_key = form_key,
            Record::TextureSet(r) => r.form_key = form_key,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Record::Npc(_) => Npc::KIND,
            Record::HeadPart(_) => HeadPart::KIND,
            Record::Armor(_) => Armor::KIND,
            Record::ArmorAddon(_) => ArmorAddon::KIND,
            Record::TextureSet(_) => TextureSet::KIND,
        }
    }

    /// Every FormKey this record references.
    pub fn form_links(&self) -> Vec<FormKey> {
        match self {
            Record::Npc(npc) => npc.form_links(),
            Record::HeadPart(hp) => hp
                .texture_set
                .iter()
                .chain(hp.extra_parts.iter())
                .cloned()
                .collect(),
            Record::Armor(armor) => armor.armature.clone(),
            Record::ArmorAddon(aa) => aa.skin_texture.iter().cloned().collect(),
            Record::TextureSet(_) => Vec::new(),
        }
    }

    /// Rewrite every reference found in `table`. Returns the number of links changed.
    pub fn remap_links(&mut self, table: &RemapTable) -> usize {
        match self {
            Record::Npc(npc) => npc.remap_links(table),
            Record::HeadPart(hp) => remap_all(
                hp.texture_set.iter_mut().chain(hp.extra_parts.iter_mut()),
                table,
            ),
            Record::Armor(armor) => remap_all(armor.armature.iter_mut(), table),
            Record::ArmorAddon(aa) => remap_all(
                aa.skin_texture
                    .male
                    .iter_mut()
                    .chain(aa.skin_texture.female.iter_mut()),
                table,
            ),
            Record::TextureSet(_) => 0,
        }
    }
}

/// Typed view over [`Record`], used for `try_resolve::<T>()` lookups.
pub trait RecordKind: Sized {
    const KIND: &'static str;

    fn from_record(record: &Record) -> Option<&Self>;
}

impl RecordKind for Npc {
    const KIND: &'static str = "NPC_";

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::Npc(r) => Some(r),
            _ => None,
        }
    }
}

impl RecordKind for HeadPart {
    const KIND: &'static str = "HDPT";

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::HeadPart(r) => Some(r),
            _ => None,
        }
    }
}

impl RecordKind for Armor {
    const KIND: &'static str = "ARMO";

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::Armor(r) => Some(r),
            _ => None,
        }
    }
}

impl RecordKind for ArmorAddon {
    const KIND: &'static str = "ARMA";

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::ArmorAddon(r) => Some(r),
            _ => None,
        }
    }
}

impl RecordKind for TextureSet {
    const KIND: &'static str = "TXST";

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::TextureSet(r) => Some(r),
            _ => None,
        }
    }
}
