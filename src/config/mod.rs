use crate::errors::ConfigError;
use crate::keyboard::keysyms::keysym_from_str;
use crate::keyboard::{Arg, ButtonBinding, KeyAction, KeyBinding};
use crate::bar::ClickRegion;
use crate::layout::LayoutType;
use crate::monitor::{AttachPolicy, TabMode};
use crate::{ColorScheme, Config, Rule, Scratchpad};
use serde::Deserialize;
use std::path::PathBuf;
use x11rb::protocol::xproto::KeyButMask;

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum ModKey {
    Mod,
    Mod1,
    Mod2,
    Mod3,
    Mod4,
    Mod5,
    Shift,
    Control,
}

impl ModKey {
    fn to_keybut_mask(self, modkey: KeyButMask) -> KeyButMask {
        match self {
            ModKey::Mod => modkey,
            ModKey::Mod1 => KeyButMask::MOD1,
            ModKey::Mod2 => KeyButMask::MOD2,
            ModKey::Mod3 => KeyButMask::MOD3,
            ModKey::Mod4 => KeyButMask::MOD4,
            ModKey::Mod5 => KeyButMask::MOD5,
            ModKey::Shift => KeyButMask::SHIFT,
            ModKey::Control => KeyButMask::CONTROL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum ArgData {
    #[default]
    None,
    Int(i32),
    Float(f32),
    String(String),
    Array(Vec<String>),
}

impl From<ArgData> for Arg {
    fn from(data: ArgData) -> Self {
        match data {
            ArgData::None => Arg::None,
            ArgData::Int(value) => Arg::Int(value),
            ArgData::Float(value) => Arg::Float(value),
            ArgData::String(value) => Arg::Str(value),
            ArgData::Array(value) => Arg::Array(value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeybindingData {
    #[serde(default)]
    modifiers: Vec<ModKey>,
    key: String,
    action: KeyAction,
    #[serde(default)]
    arg: ArgData,
}

#[derive(Debug, Deserialize)]
struct ButtonData {
    click: ClickRegion,
    #[serde(default)]
    modifiers: Vec<ModKey>,
    button: u8,
    action: KeyAction,
    #[serde(default)]
    arg: ArgData,
}

/// Every field is optional; present fields replace the compiled-in value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigData {
    border_width: Option<u32>,
    font: Option<String>,
    show_bar: Option<bool>,
    top_bar: Option<bool>,
    tab_mode: Option<TabMode>,
    top_tab: Option<bool>,
    snap: Option<i32>,

    gaps_enabled: Option<bool>,
    gap_inner_horizontal: Option<u32>,
    gap_inner_vertical: Option<u32>,
    gap_outer_horizontal: Option<u32>,
    gap_outer_vertical: Option<u32>,

    master_factor: Option<f32>,
    num_master: Option<i32>,
    resize_hints: Option<bool>,
    min_slot_height: Option<i32>,
    layouts: Option<Vec<LayoutType>>,
    attach_policies: Option<Vec<AttachPolicy>>,

    modkey: Option<ModKey>,
    tags: Option<Vec<String>>,
    keybindings: Option<Vec<KeybindingData>>,
    buttons: Option<Vec<ButtonData>>,
    rules: Option<Vec<Rule>>,
    scratchpads: Option<Vec<Scratchpad>>,
    notify_command: Option<Vec<String>>,
    autostart: Option<Vec<Vec<String>>>,

    systray_enabled: Option<bool>,
    systray_spacing: Option<u32>,

    scheme_normal: Option<ColorScheme>,
    scheme_selected: Option<ColorScheme>,
    scheme_urgent: Option<ColorScheme>,
    status_schemes: Option<Vec<ColorScheme>>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tagwm").join("config.ron"))
}

/// Compiled-in defaults, overlaid with the user's file when one exists.
/// A broken overlay is reported and ignored.
pub fn load() -> Config {
    let defaults = Config::default();
    let Some(path) = config_path() else {
        return defaults;
    };
    if !path.exists() {
        return defaults;
    }

    let result = std::fs::read_to_string(&path)
        .map_err(ConfigError::CouldNotReadConfig)
        .and_then(|input| parse_config(&input, Config::default()));

    match result {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config overlay");
            config
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "ignoring config overlay");
            defaults
        }
    }
}

pub fn parse_config(input: &str, base: Config) -> Result<Config, ConfigError> {
    let data: ConfigData = ron::from_str(input)?;
    let config = apply_overlay(data, base)?;
    config.validate()?;
    Ok(config)
}

fn modifier_masks(modifiers: &[ModKey], modkey: KeyButMask) -> Vec<KeyButMask> {
    modifiers
        .iter()
        .map(|modifier| modifier.to_keybut_mask(modkey))
        .collect()
}

fn apply_overlay(data: ConfigData, mut config: Config) -> Result<Config, ConfigError> {
    macro_rules! replace {
        ($($field:ident),* $(,)?) => {
            $(if let Some(value) = data.$field {
                config.$field = value;
            })*
        };
    }

    if let Some(modkey) = data.modkey {
        config.modkey = match modkey {
            ModKey::Mod => return Err(ConfigError::InvalidModkey("Mod".to_string())),
            other => other.to_keybut_mask(config.modkey),
        };
    }
    let modkey = config.modkey;

    if let Some(keybindings) = data.keybindings {
        config.keybindings = keybindings
            .into_iter()
            .map(|binding| {
                let keysym = keysym_from_str(&binding.key)
                    .ok_or_else(|| ConfigError::UnknownKey(binding.key.clone()))?;
                Ok(KeyBinding::new(
                    modifier_masks(&binding.modifiers, modkey),
                    keysym,
                    binding.action,
                    binding.arg.into(),
                ))
            })
            .collect::<Result<_, ConfigError>>()?;
    }

    if let Some(buttons) = data.buttons {
        config.buttons = buttons
            .into_iter()
            .map(|binding| {
                ButtonBinding::new(
                    binding.click,
                    modifier_masks(&binding.modifiers, modkey),
                    binding.button,
                    binding.action,
                    binding.arg.into(),
                )
            })
            .collect();
    }

    replace!(
        border_width,
        font,
        show_bar,
        top_bar,
        tab_mode,
        top_tab,
        snap,
        gaps_enabled,
        gap_inner_horizontal,
        gap_inner_vertical,
        gap_outer_horizontal,
        gap_outer_vertical,
        master_factor,
        num_master,
        resize_hints,
        min_slot_height,
        layouts,
        attach_policies,
        tags,
        rules,
        scratchpads,
        notify_command,
        autostart,
        systray_enabled,
        systray_spacing,
        scheme_normal,
        scheme_selected,
        scheme_urgent,
        status_schemes,
    );

    config.master_factor = config.master_factor.clamp(0.05, 0.95);
    config.num_master = config.num_master.max(0);
    Ok(config)
}
