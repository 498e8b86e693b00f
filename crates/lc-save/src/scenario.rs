//! Typed view over a scenario/save archive's core-relevant text entries
//! (spec §6): `Scenario.txt`'s head/game/players/landscape/... blocks and
//! `Objects.txt`'s per-object records. Grounded on the teacher's
//! `g_save.rs` field-table style (named fields pulled out of a flat
//! key=value store one at a time) rather than full `serde` derive, since
//! the archive's nesting (per-object sections named `Object1`, `Object2`,
//! ...) doesn't map cleanly onto a single struct the way a flat config
//! file would.
use lc_script::{ObjectHandle, Value};

use crate::ini::{IniDocument, IniSection};
use crate::value_codec::{decode_tree, encode_tree, CodecError};

/// `Scenario.txt`'s `[Head]` block: the entries every scenario needs
/// regardless of game mode.
#[derive(Debug, Clone, Default)]
pub struct ScenarioHead {
    pub icon: i32,
    pub difficulty: i32,
    pub save_game: bool,
    pub replay: bool,
    pub original_filename: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioGame {
    pub mode: String,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioLandscape {
    pub width: i32,
    pub height: i32,
    pub map_width: i32,
    pub map_height: i32,
    pub sky: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioEnvironment {
    pub wind_speed: i32,
    pub temperature: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioCore {
    pub head: ScenarioHead,
    pub game: ScenarioGame,
    pub landscape: ScenarioLandscape,
    pub environment: ScenarioEnvironment,
    pub definitions: Vec<String>,
    pub players: Vec<String>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn join_list(items: &[String]) -> String {
    items.join(";")
}

impl ScenarioCore {
    pub fn from_ini(doc: &IniDocument) -> Self {
        let head = doc.section("Head");
        let game = doc.section("Game");
        let landscape = doc.section("Landscape");
        let environment = doc.section("Environment");
        ScenarioCore {
            head: ScenarioHead {
                icon: head.map_or(0, |s| s.get_int("Icon", 0)),
                difficulty: head.map_or(0, |s| s.get_int("Difficulty", 0)),
                save_game: head.map_or(false, |s| s.get_bool("SaveGame", false)),
                replay: head.map_or(false, |s| s.get_bool("Replay", false)),
                original_filename: head.and_then(|s| s.get("OriginalFilename")).unwrap_or_default().to_string(),
            },
            game: ScenarioGame {
                mode: game.and_then(|s| s.get("Mode")).unwrap_or_default().to_string(),
                rules: game.map(|s| split_list(s.get_or("Rules", ""))).unwrap_or_default(),
            },
            landscape: ScenarioLandscape {
                width: landscape.map_or(0, |s| s.get_int("Width", 0)),
                height: landscape.map_or(0, |s| s.get_int("Height", 0)),
                map_width: landscape.map_or(0, |s| s.get_int("MapWidth", 0)),
                map_height: landscape.map_or(0, |s| s.get_int("MapHeight", 0)),
                sky: landscape.and_then(|s| s.get("Sky")).unwrap_or_default().to_string(),
            },
            environment: ScenarioEnvironment {
                wind_speed: environment.map_or(0, |s| s.get_int("WindSpeed", 0)),
                temperature: environment.map_or(20, |s| s.get_int("Temperature", 20)),
            },
            definitions: doc.section("Definitions").map(|s| split_list(s.get_or("List", ""))).unwrap_or_default(),
            players: doc.section("Players").map(|s| split_list(s.get_or("List", ""))).unwrap_or_default(),
        }
    }

    pub fn to_ini(&self) -> IniDocument {
        let mut doc = IniDocument::new();
        {
            let head = doc.section_mut("Head");
            head.set("Icon", self.head.icon.to_string());
            head.set("Difficulty", self.head.difficulty.to_string());
            head.set("SaveGame", if self.head.save_game { "1" } else { "0" });
            head.set("Replay", if self.head.replay { "1" } else { "0" });
            head.set("OriginalFilename", self.head.original_filename.clone());
        }
        {
            let game = doc.section_mut("Game");
            game.set("Mode", self.game.mode.clone());
            game.set("Rules", join_list(&self.game.rules));
        }
        {
            let landscape = doc.section_mut("Landscape");
            landscape.set("Width", self.landscape.width.to_string());
            landscape.set("Height", self.landscape.height.to_string());
            landscape.set("MapWidth", self.landscape.map_width.to_string());
            landscape.set("MapHeight", self.landscape.map_height.to_string());
            landscape.set("Sky", self.landscape.sky.clone());
        }
        {
            let environment = doc.section_mut("Environment");
            environment.set("WindSpeed", self.environment.wind_speed.to_string());
            environment.set("Temperature", self.environment.temperature.to_string());
        }
        doc.section_mut("Definitions").set("List", join_list(&self.definitions));
        doc.section_mut("Players").set("List", join_list(&self.players));
        doc
    }
}

/// One `Objects.txt` record: the object's placement fields plus its saved
/// script-local variables, value-serialized and hex-encoded so they sit
/// inline in a text section alongside the plain fields.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub id: u32,
    pub definition: String,
    pub x: i32,
    pub y: i32,
    pub r: i32,
    pub owner: i32,
    pub controller: i32,
    pub local_vars: Value,
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len()).step_by(2).map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok()).collect()
}

impl ObjectRecord {
    /// Encodes this record's local variables through the enumerate/encode
    /// pipeline and writes every field into `section`. The handle table is
    /// returned to the caller, who owns merging it into the archive-wide
    /// table written once per `Objects.txt` (object references must
    /// resolve across records, not just within one).
    pub fn write_into(&self, section: &mut IniSection) -> std::collections::HashMap<u32, ObjectHandle> {
        section.set("Id", self.id.to_string());
        section.set("Definition", self.definition.clone());
        section.set("X", self.x.to_string());
        section.set("Y", self.y.to_string());
        section.set("R", self.r.to_string());
        section.set("Owner", self.owner.to_string());
        section.set("Controller", self.controller.to_string());
        let (bytes, table) = encode_tree(&self.local_vars);
        section.set("LocalVars", to_hex(&bytes));
        table
    }

    pub fn read_from(
        section: &IniSection,
        handles: &std::collections::HashMap<u32, ObjectHandle>,
    ) -> Result<Self, CodecError> {
        let hex = section.get_or("LocalVars", "");
        let bytes = from_hex(hex).unwrap_or_default();
        let local_vars = if bytes.is_empty() { Value::Nil } else { decode_tree(&bytes, handles.clone())? };
        Ok(ObjectRecord {
            id: section.get_int("Id", 0) as u32,
            definition: section.get_or("Definition", "").to_string(),
            x: section.get_int("X", 0),
            y: section.get_int("Y", 0),
            r: section.get_int("R", 0),
            owner: section.get_int("Owner", -1),
            controller: section.get_int("Controller", -1),
            local_vars,
        })
    }
}

/// Writes every record as its own `ObjectN` section, in order.
pub fn write_objects(records: &[ObjectRecord]) -> IniDocument {
    let mut doc = IniDocument::new();
    for (i, record) in records.iter().enumerate() {
        let section = doc.section_mut(&format!("Object{}", i + 1));
        record.write_into(section);
    }
    doc
}

pub fn read_objects(
    doc: &IniDocument,
    handles: &std::collections::HashMap<u32, ObjectHandle>,
) -> Result<Vec<ObjectRecord>, CodecError> {
    doc.sections_with_prefix("Object").map(|section| ObjectRecord::read_from(section, handles)).collect()
}
