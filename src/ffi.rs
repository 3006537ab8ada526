//! FFI boundary definitions for C interop

use std::cell::RefCell;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::ptr::{self, NonNull};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::LocalKey;

use crate::config::{ProviderKind, Settings};
use crate::logging::init_logging;
use crate::projector::{AnyProvider, TransientFailure};
use crate::properties::{eligible_sinks, is_eligible_sink, Panel};
use crate::provider::ProviderError;
use crate::sink::{run_tick, DisplaySink};
use crate::timer::Ticker;

/// Opaque handle to the Rust core state
pub struct ObsStatusCore {
    provider: AnyProvider,
    settings: Arc<Mutex<Settings>>,
    last_error: Arc<Mutex<Option<String>>>,
    ticker: Ticker,
    timer_sink: Option<CDisplaySink>,
}

/// Look up a text source by name. Returns null if it does not exist.
pub type CAcquireSourceFn =
    unsafe extern "C" fn(user_data: *mut c_void, name: *const c_char) -> *mut c_void;

/// Replace the text of an acquired source and re-render it
pub type CUpdateTextFn =
    unsafe extern "C" fn(user_data: *mut c_void, source: *mut c_void, text: *const c_char);

/// Release a source returned by the acquire callback
pub type CReleaseSourceFn = unsafe extern "C" fn(user_data: *mut c_void, source: *mut c_void);

/// Host callbacks for writing to text sources
///
/// When passed to `obs_status_core_start_timer` the callbacks are invoked
/// from a background thread, so they must be thread safe.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CDisplaySink {
    /// Passed back unchanged as the first argument of every callback
    pub user_data: *mut c_void,
    pub acquire: Option<CAcquireSourceFn>,
    pub update_text: Option<CUpdateTextFn>,
    pub release: Option<CReleaseSourceFn>,
}

/// Result codes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CResultCode {
    Ok = 0,
    InvalidArgument = 1,
    NetworkError = 2,
    ParseError = 3,
}

/// `CDisplaySink` with every callback resolved
struct HostSink {
    user_data: *mut c_void,
    acquire: CAcquireSourceFn,
    update_text: CUpdateTextFn,
    release: CReleaseSourceFn,
}

// The host guarantees its source API may be called from any thread.
unsafe impl Send for HostSink {}

impl HostSink {
    fn from_c(sink: &CDisplaySink) -> Option<Self> {
        Some(HostSink {
            user_data: sink.user_data,
            acquire: sink.acquire?,
            update_text: sink.update_text?,
            release: sink.release?,
        })
    }
}

impl DisplaySink for HostSink {
    type Handle = NonNull<c_void>;

    fn acquire(&self, name: &str) -> Option<NonNull<c_void>> {
        let name = CString::new(name).ok()?;
        NonNull::new(unsafe { (self.acquire)(self.user_data, name.as_ptr()) })
    }

    fn update_text(&self, handle: &NonNull<c_void>, text: &str) {
        let text = CString::new(text.replace('\0', "")).unwrap_or_default();
        unsafe { (self.update_text)(self.user_data, handle.as_ptr(), text.as_ptr()) }
    }

    fn release(&self, handle: NonNull<c_void>) {
        unsafe { (self.release)(self.user_data, handle.as_ptr()) }
    }
}

// Static storage for strings returned to C
// These are overwritten on each call, so C code must copy if needed
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
    static DESCRIPTION: RefCell<Option<CString>> = RefCell::new(None);
    static PROPERTIES: RefCell<Option<CString>> = RefCell::new(None);
}

fn stash(cell: &'static LocalKey<RefCell<Option<CString>>>, s: &str) -> *const c_char {
    cell.with(|cell| {
        let cstring = CString::new(s.replace('\0', "")).unwrap_or_default();
        let ptr = cstring.as_ptr();
        *cell.borrow_mut() = Some(cstring);
        ptr
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

unsafe fn read_str(s: *const c_char) -> Option<String> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok().map(str::to_string)
}

/// Run one tick with the current settings and record any failure
fn tick_once(
    provider: &AnyProvider,
    settings: &Mutex<Settings>,
    last_error: &Mutex<Option<String>>,
    sink: &HostSink,
) -> CResultCode {
    let Settings {
        identifier,
        text_source_name,
        ..
    } = lock(settings).clone();

    match run_tick(sink, &text_source_name, provider, &identifier) {
        Ok(()) => CResultCode::Ok,
        Err(err) => record_failure(last_error, err),
    }
}

fn record_failure(last_error: &Mutex<Option<String>>, err: TransientFailure) -> CResultCode {
    let code = match err.source {
        ProviderError::ParseError(_) => CResultCode::ParseError,
        ProviderError::NotFound | ProviderError::NetworkError(_) => CResultCode::NetworkError,
    };
    *lock(last_error) = Some(err.to_string());
    code
}

impl ObsStatusCore {
    fn new(kind: ProviderKind) -> Self {
        ObsStatusCore {
            provider: kind.provider(),
            settings: Arc::new(Mutex::new(Settings::default())),
            last_error: Arc::new(Mutex::new(None)),
            ticker: Ticker::new(),
            timer_sink: None,
        }
    }

    /// (Re)start the background timer with the current refresh rate
    fn start_timer(&mut self, sink: CDisplaySink) -> CResultCode {
        let host_sink = match HostSink::from_c(&sink) {
            Some(s) => s,
            None => return CResultCode::InvalidArgument,
        };

        let interval = lock(&self.settings).interval();
        tracing::info!("Starting {} timer", self.provider.name());
        let provider = self.provider.clone();
        let settings = Arc::clone(&self.settings);
        let last_error = Arc::clone(&self.last_error);

        self.ticker.schedule(interval, move || {
            tick_once(&provider, &settings, &last_error, &host_sink);
        });
        self.timer_sink = Some(sink);
        CResultCode::Ok
    }

    fn stop_timer(&mut self) {
        self.ticker.cancel();
        self.timer_sink = None;
    }

    /// Replace the settings, rescheduling the timer if the period changed
    fn apply_settings(&mut self, settings: Settings) -> CResultCode {
        let old_interval = {
            let mut current = lock(&self.settings);
            let old = current.interval();
            *current = settings;
            old
        };

        let new_interval = lock(&self.settings).interval();
        match self.timer_sink {
            Some(sink) if self.ticker.is_active() && new_interval != old_interval => {
                self.start_timer(sink)
            }
            _ => CResultCode::Ok,
        }
    }
}

/// Create a new core instance for the given provider
///
/// # Safety
/// Returns a pointer that must be freed with `obs_status_core_free`
#[no_mangle]
pub extern "C" fn obs_status_core_new(kind: ProviderKind) -> *mut ObsStatusCore {
    init_logging();
    tracing::debug!("Creating core for {:?}", kind);
    Box::into_raw(Box::new(ObsStatusCore::new(kind)))
}

/// Free the core instance, stopping its timer
///
/// # Safety
/// `core` must be a valid pointer returned by `obs_status_core_new`
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_free(core: *mut ObsStatusCore) {
    if !core.is_null() {
        drop(Box::from_raw(core));
    }
}

/// Replace all settings from the host's settings JSON object
///
/// A refresh rate change reschedules a running timer without waiting for an
/// in-flight tick.
///
/// # Safety
/// `core` must be valid, `json` must be a valid C string
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_update_settings(
    core: *mut ObsStatusCore,
    json: *const c_char,
) -> CResultCode {
    let core = match core.as_mut() {
        Some(c) => c,
        None => return CResultCode::InvalidArgument,
    };

    let json = match read_str(json) {
        Some(j) => j,
        None => return CResultCode::InvalidArgument,
    };

    let kind = match core.provider {
        AnyProvider::ChessCom(_) => ProviderKind::ChessCom,
        AnyProvider::Deezer(_) => ProviderKind::Deezer,
    };

    match Settings::from_json(kind, &json) {
        Ok(settings) => core.apply_settings(settings),
        Err(e) => {
            tracing::warn!("Ignoring settings update: {}", e);
            *lock(&core.last_error) = Some(e.to_string());
            CResultCode::ParseError
        }
    }
}

/// Set the username / profile ID to poll
///
/// # Safety
/// `core` must be valid, `identifier` must be a valid C string or null for empty
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_set_identifier(
    core: *mut ObsStatusCore,
    identifier: *const c_char,
) {
    if let Some(core) = core.as_mut() {
        lock(&core.settings).identifier = read_str(identifier).unwrap_or_default();
    }
}

/// Set the name of the text source to write into
///
/// # Safety
/// `core` must be valid, `name` must be a valid C string or null for none
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_set_text_source(
    core: *mut ObsStatusCore,
    name: *const c_char,
) {
    if let Some(core) = core.as_mut() {
        lock(&core.settings).text_source_name = read_str(name).unwrap_or_default();
    }
}

/// Set the refresh rate in Hz (clamped to 1-60), rescheduling a running timer
///
/// Returns without waiting for a tick that is still fetching; that tick
/// completes on the old timer thread, which then stops.
///
/// # Safety
/// `core` must be valid
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_set_refresh_rate(
    core: *mut ObsStatusCore,
    refresh_rate: i32,
) -> CResultCode {
    let core = match core.as_mut() {
        Some(c) => c,
        None => return CResultCode::InvalidArgument,
    };

    let mut settings = lock(&core.settings).clone();
    settings.set_refresh_rate(refresh_rate);
    core.apply_settings(settings)
}

/// Timer period in milliseconds for the current refresh rate
///
/// # Safety
/// `core` must be valid
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_interval_ms(core: *const ObsStatusCore) -> u32 {
    match core.as_ref() {
        Some(core) => lock(&core.settings).interval().as_millis() as u32,
        None => 0,
    }
}

/// Fetch and write the status once (blocking)
///
/// Use this from a host-owned timer. On `NetworkError`/`ParseError` the text
/// source is left unchanged and the message is available from
/// `obs_status_core_last_error`.
///
/// # Safety
/// `core` must be valid, `sink` must point to a valid sink table
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_tick(
    core: *mut ObsStatusCore,
    sink: *const CDisplaySink,
) -> CResultCode {
    let core = match core.as_ref() {
        Some(c) => c,
        None => return CResultCode::InvalidArgument,
    };

    let sink = match sink.as_ref().and_then(HostSink::from_c) {
        Some(s) => s,
        None => return CResultCode::InvalidArgument,
    };

    tick_once(&core.provider, &core.settings, &core.last_error, &sink)
}

/// Start a background timer that ticks at the configured refresh rate
///
/// Any previously started timer is stopped first.
///
/// # Safety
/// `core` must be valid, and the sink callbacks must stay valid and thread
/// safe until the timer is stopped or the core is freed
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_start_timer(
    core: *mut ObsStatusCore,
    sink: CDisplaySink,
) -> CResultCode {
    match core.as_mut() {
        Some(core) => core.start_timer(sink),
        None => CResultCode::InvalidArgument,
    }
}

/// Stop the background timer, waiting for an in-flight tick to finish
///
/// Blocks for as long as that fetch takes, so the sink callbacks are never
/// called after this returns.
///
/// # Safety
/// `core` must be valid
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_stop_timer(core: *mut ObsStatusCore) {
    if let Some(core) = core.as_mut() {
        core.stop_timer();
    }
}

/// Message of the most recent failure, null if none
///
/// # Safety
/// `core` must be valid
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_last_error(core: *const ObsStatusCore) -> *const c_char {
    let core = match core.as_ref() {
        Some(c) => c,
        None => return ptr::null(),
    };

    match lock(&core.last_error).as_deref() {
        Some(msg) => stash(&LAST_ERROR, msg),
        None => ptr::null(),
    }
}

/// Script description shown by the host
#[no_mangle]
pub extern "C" fn obs_status_core_description(kind: ProviderKind) -> *const c_char {
    stash(&DESCRIPTION, crate::properties::description(kind))
}

/// Properties panel as JSON: description, defaults and controls
///
/// `source_ids` and `source_names` are parallel arrays of `count` enumerated
/// sources; only text sources end up in the text source list.
///
/// # Safety
/// Both arrays must hold `count` valid C strings (or be null with `count` 0)
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_properties_json(
    kind: ProviderKind,
    source_ids: *const *const c_char,
    source_names: *const *const c_char,
    count: usize,
) -> *const c_char {
    let mut sources = Vec::with_capacity(count);
    if count > 0 && !source_ids.is_null() && !source_names.is_null() {
        for i in 0..count {
            let id = read_str(*source_ids.add(i));
            let name = read_str(*source_names.add(i));
            if let (Some(id), Some(name)) = (id, name) {
                sources.push((id, name));
            }
        }
    }

    let names = eligible_sinks(sources.iter().map(|(id, name)| (id.as_str(), name.as_str())));
    match serde_json::to_string(&Panel::new(kind, names)) {
        Ok(json) => stash(&PROPERTIES, &json),
        Err(e) => {
            tracing::warn!("Failed to serialize properties: {}", e);
            ptr::null()
        }
    }
}

/// Whether a source type id is a text source this plugin can write to
///
/// # Safety
/// `source_id` must be a valid C string or null
#[no_mangle]
pub unsafe extern "C" fn obs_status_core_is_eligible_source(source_id: *const c_char) -> bool {
    read_str(source_id).map_or(false, |id| is_eligible_sink(&id))
}
