use super::keysyms::Keysym;
use super::{Arg, KeyAction};
use crate::bar::ClickRegion;
use x11rb::protocol::xproto::{KeyButMask, ModMask};

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub modifiers: Vec<KeyButMask>,
    pub keysym: Keysym,
    pub func: KeyAction,
    pub arg: Arg,
}

impl KeyBinding {
    pub fn new(modifiers: Vec<KeyButMask>, keysym: Keysym, func: KeyAction, arg: Arg) -> Self {
        Self {
            modifiers,
            keysym,
            func,
            arg,
        }
    }

    pub fn modifier_mask(&self) -> u16 {
        modifiers_to_mask(&self.modifiers)
    }
}

#[derive(Debug, Clone)]
pub struct ButtonBinding {
    pub click: ClickRegion,
    pub modifiers: Vec<KeyButMask>,
    pub button: u8,
    pub func: KeyAction,
    pub arg: Arg,
}

impl ButtonBinding {
    pub fn new(
        click: ClickRegion,
        modifiers: Vec<KeyButMask>,
        button: u8,
        func: KeyAction,
        arg: Arg,
    ) -> Self {
        Self {
            click,
            modifiers,
            button,
            func,
            arg,
        }
    }

    pub fn modifier_mask(&self) -> u16 {
        modifiers_to_mask(&self.modifiers)
    }
}

pub fn modifiers_to_mask(modifiers: &[KeyButMask]) -> u16 {
    modifiers
        .iter()
        .fold(0u16, |acc, &modifier| acc | u16::from(modifier))
}

/// Drops lock-style modifiers (caps lock and num lock on mod2) and pointer
/// button bits from an event state.
pub fn clean_mask(state: u16) -> u16 {
    let relevant = ModMask::SHIFT | ModMask::CONTROL | ModMask::M1 | ModMask::M3 | ModMask::M4 | ModMask::M5;
    state & u16::from(relevant)
}

pub fn handle_key_press(keysym: Keysym, state: u16, keybindings: &[KeyBinding]) -> (KeyAction, Arg) {
    let state = clean_mask(state);

    keybindings
        .iter()
        .find(|binding| binding.keysym == keysym && binding.modifier_mask() == state)
        .map(|binding| (binding.func, binding.arg.clone()))
        .unwrap_or((KeyAction::None, Arg::None))
}

pub fn handle_button_press(
    click: ClickRegion,
    button: u8,
    state: u16,
    buttons: &[ButtonBinding],
) -> Option<(KeyAction, Arg)> {
    let state = clean_mask(state);

    buttons
        .iter()
        .find(|binding| {
            binding.click == click && binding.button == button && binding.modifier_mask() == state
        })
        .map(|binding| (binding.func, binding.arg.clone()))
}

#[cfg(test)]
mod tests {
    use super::super::keysyms::{XK_J, XK_K};
    use super::*;

    fn bindings() -> Vec<KeyBinding> {
        vec![
            KeyBinding::new(vec![KeyButMask::MOD4], XK_J, KeyAction::FocusStack, Arg::Int(1)),
            KeyBinding::new(
                vec![KeyButMask::MOD4, KeyButMask::SHIFT],
                XK_J,
                KeyAction::Zoom,
                Arg::None,
            ),
        ]
    }

    #[test]
    fn lock_modifiers_are_ignored() {
        let state = u16::from(KeyButMask::MOD4 | KeyButMask::LOCK | KeyButMask::MOD2);
        let (action, arg) = handle_key_press(XK_J, state, &bindings());

        assert_eq!(action, KeyAction::FocusStack);
        assert_eq!(arg, Arg::Int(1));
    }

    #[test]
    fn modifiers_must_match_exactly() {
        let state = u16::from(KeyButMask::MOD4 | KeyButMask::SHIFT);
        assert_eq!(handle_key_press(XK_J, state, &bindings()).0, KeyAction::Zoom);
        assert_eq!(handle_key_press(XK_K, state, &bindings()).0, KeyAction::None);
    }

    #[test]
    fn buttons_match_on_region() {
        let buttons = vec![ButtonBinding::new(
            ClickRegion::ClientWindow,
            vec![KeyButMask::MOD4],
            1,
            KeyAction::MoveMouse,
            Arg::None,
        )];
        let state = u16::from(KeyButMask::MOD4);

        assert!(handle_button_press(ClickRegion::ClientWindow, 1, state, &buttons).is_some());
        assert!(handle_button_press(ClickRegion::RootWindow, 1, state, &buttons).is_none());
    }
}
