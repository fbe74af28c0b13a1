use x11rb::atom_manager;

atom_manager! {
    pub AtomCache: AtomCacheCookie {
        UTF8_STRING,

        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        WM_TAKE_FOCUS,
        WM_STATE,

        _NET_SUPPORTED,
        _NET_SUPPORTING_WM_CHECK,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DIALOG,
        _NET_ACTIVE_WINDOW,
        _NET_CLIENT_LIST,
        _NET_NUMBER_OF_DESKTOPS,
        _NET_DESKTOP_NAMES,
        _NET_CURRENT_DESKTOP,
        _NET_WM_DESKTOP,

        _NET_SYSTEM_TRAY_S0,
        _NET_SYSTEM_TRAY_OPCODE,
        _NET_SYSTEM_TRAY_ORIENTATION,
        _NET_SYSTEM_TRAY_ORIENTATION_HORZ,
        MANAGER,
        _XEMBED,
        _XEMBED_INFO,
    }
}

impl AtomCache {
    /// Atoms advertised through `_NET_SUPPORTED`.
    pub fn supported(&self) -> Vec<u32> {
        vec![
            self._NET_SUPPORTED,
            self._NET_SUPPORTING_WM_CHECK,
            self._NET_WM_NAME,
            self._NET_WM_STATE,
            self._NET_WM_STATE_FULLSCREEN,
            self._NET_WM_WINDOW_TYPE,
            self._NET_WM_WINDOW_TYPE_DIALOG,
            self._NET_ACTIVE_WINDOW,
            self._NET_CLIENT_LIST,
            self._NET_NUMBER_OF_DESKTOPS,
            self._NET_DESKTOP_NAMES,
            self._NET_CURRENT_DESKTOP,
            self._NET_WM_DESKTOP,
            self._NET_SYSTEM_TRAY_S0,
            self._NET_SYSTEM_TRAY_OPCODE,
            self._NET_SYSTEM_TRAY_ORIENTATION,
        ]
    }
}
