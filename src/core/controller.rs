use crate::core::debounce::Debouncer;
use crate::domain::model::{
    dedup_by_name, dedup_postal_codes, FormError, FormState, InputMode, Locality, LocalityQuery,
};
use crate::domain::ports::{ConfigProvider, LocalityLookup};
use crate::utils::error::{ErrorKind, LookupContext, LookupError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub const CITY_DIGITS_MESSAGE: &str = "City names cannot contain numbers.";
pub const NO_MATCHING_CITY_MESSAGE: &str = "No matching city found. Please check your spelling.";
pub const INVALID_POSTAL_CODE_MESSAGE: &str = "Invalid postal code.";
pub const NO_POSTAL_CODES_MESSAGE: &str = "No postal codes found for this locality.";

pub fn postal_code_length_message(length: usize) -> String {
    format!("Postal code must be {} digits.", length)
}

/// Keeps ASCII digits only, truncated to `max_len`.
pub fn sanitize_postal_code(text: &str, max_len: usize) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit())
        .take(max_len)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    City,
    PostalCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPurpose {
    CitySearch,
    PostalCodeSearch,
    CitySelection,
}

impl LookupPurpose {
    fn context(self) -> LookupContext {
        match self {
            LookupPurpose::CitySearch => LookupContext::Localities,
            LookupPurpose::PostalCodeSearch | LookupPurpose::CitySelection => {
                LookupContext::PostalCodes
            }
        }
    }
}

/// Messages posted back to the controller by timer and lookup tasks.
#[derive(Debug)]
pub enum ControllerEvent {
    DebounceElapsed {
        field: Field,
        generation: u64,
    },
    LookupFinished {
        request_id: u64,
        purpose: LookupPurpose,
        result: Result<Vec<Locality>, LookupError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSettings {
    pub debounce: Duration,
    pub min_city_length: usize,
    pub postal_code_length: usize,
}

impl FormSettings {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            debounce: config.debounce(),
            min_city_length: config.min_city_length(),
            postal_code_length: config.postal_code_length(),
        }
    }
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            min_city_length: 3,
            postal_code_length: 5,
        }
    }
}

/// Owns the address form state and reconciles the city and postal code
/// fields against the locality lookup.
///
/// Timers and lookups run as spawned tasks that only post
/// [`ControllerEvent`]s; the state itself is touched exclusively through
/// `&mut self`, either by the `on_*` input handlers or by
/// [`process_next`](Self::process_next). Every lookup is tagged with a
/// request id and only the newest one is applied, so a slow response can
/// never overwrite the outcome of a later keystroke.
///
/// Must be used from within a Tokio runtime.
pub struct AddressController<L: LocalityLookup + 'static> {
    state: FormState,
    settings: FormSettings,
    lookup: Arc<L>,
    city_timer: Debouncer,
    postal_timer: Debouncer,
    events_tx: UnboundedSender<ControllerEvent>,
    events_rx: UnboundedReceiver<ControllerEvent>,
    request_seq: u64,
    current_request: Option<u64>,
}

impl<L: LocalityLookup + 'static> AddressController<L> {
    pub fn new(lookup: Arc<L>, settings: FormSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            state: FormState::default(),
            city_timer: Debouncer::new(settings.debounce),
            postal_timer: Debouncer::new(settings.debounce),
            settings,
            lookup,
            events_tx,
            events_rx,
            request_seq: 0,
            current_request: None,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// No armed timer and no outstanding current lookup.
    pub fn is_idle(&self) -> bool {
        !self.city_timer.is_armed() && !self.postal_timer.is_armed() && self.current_request.is_none()
    }

    pub fn on_city_text_changed(&mut self, text: impl Into<String>) {
        self.enter_mode(InputMode::EditingCity);
        self.state.city_text = text.into();
        self.state.selection_confirmed = false;
        self.supersede_request();

        self.postal_timer.cancel();
        self.city_timer.schedule(&self.events_tx, |generation| {
            ControllerEvent::DebounceElapsed {
                field: Field::City,
                generation,
            }
        });
    }

    pub fn on_postal_code_text_changed(&mut self, text: &str) {
        let sanitized = sanitize_postal_code(text, self.settings.postal_code_length);

        self.enter_mode(InputMode::EditingPostalCode);
        self.state.postal_code_text = sanitized;
        self.state.selection_confirmed = false;
        self.state.postal_code_options.clear();
        self.state.postal_dropdown_open = false;
        self.supersede_request();

        self.city_timer.cancel();
        self.postal_timer.schedule(&self.events_tx, |generation| {
            ControllerEvent::DebounceElapsed {
                field: Field::PostalCode,
                generation,
            }
        });
    }

    /// Returns `false` when `name` is not among the current suggestions.
    pub fn on_city_selected(&mut self, name: &str) -> bool {
        let Some(selected) = self
            .state
            .city_suggestions
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.name.clone())
        else {
            tracing::debug!("Ignoring selection of unknown city: {}", name);
            return false;
        };

        self.city_timer.cancel();
        self.postal_timer.cancel();

        self.state.mode = InputMode::EditingCity;
        self.state.city_text = selected.clone();
        self.state.city_suggestions.clear();
        self.state.selection_confirmed = true;

        self.start_lookup(LookupPurpose::CitySelection, LocalityQuery::exact_name(selected));
        true
    }

    /// Returns `false` when `code` is not one of the offered options.
    pub fn on_postal_code_selected(&mut self, code: &str) -> bool {
        if !self.state.postal_code_options.iter().any(|c| c == code) {
            tracing::debug!("Ignoring selection of unknown postal code: {}", code);
            return false;
        }

        self.state.postal_code_text = code.to_string();
        self.state.postal_dropdown_open = false;
        self.state.error = None;
        true
    }

    pub fn on_postal_code_focused(&mut self) {
        if self.state.postal_code_options.len() > 1 {
            self.state.postal_dropdown_open = true;
        }
    }

    pub fn dismiss_dropdowns(&mut self) {
        self.state.postal_dropdown_open = false;
    }

    /// Waits for the next timer or lookup event and applies it. Returns
    /// whether the form state changed. Cancel safe.
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.handle_event(event),
            None => false,
        }
    }

    /// Processes events until the controller is idle.
    pub async fn settle(&mut self) {
        while !self.is_idle() {
            self.process_next().await;
        }
    }

    fn handle_event(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::DebounceElapsed {
                field: Field::City,
                generation,
            } => {
                if !self.city_timer.fire(generation) {
                    return false;
                }
                self.run_city_search()
            }
            ControllerEvent::DebounceElapsed {
                field: Field::PostalCode,
                generation,
            } => {
                if !self.postal_timer.fire(generation) {
                    return false;
                }
                self.run_postal_code_search()
            }
            ControllerEvent::LookupFinished {
                request_id,
                purpose,
                result,
            } => {
                if self.current_request != Some(request_id) {
                    tracing::debug!("Dropping stale lookup #{} ({:?})", request_id, purpose);
                    return false;
                }
                self.current_request = None;

                match result {
                    Ok(localities) => self.reconcile(purpose, localities),
                    Err(e) => self.apply_failure(purpose, &e),
                }
                true
            }
        }
    }

    /// 切換輸入模式時清掉另一個欄位的狀態
    fn enter_mode(&mut self, mode: InputMode) {
        if self.state.mode == mode {
            return;
        }

        match mode {
            InputMode::EditingCity => {
                self.state.postal_code_text.clear();
                self.state.postal_code_options.clear();
                self.state.postal_dropdown_open = false;
                self.state.error = None;
            }
            InputMode::EditingPostalCode => {
                self.state.city_text.clear();
                self.state.city_suggestions.clear();
                self.state.error = None;
            }
            InputMode::Idle => {}
        }
        self.state.mode = mode;
    }

    fn run_city_search(&mut self) -> bool {
        if self.state.mode != InputMode::EditingCity || self.state.selection_confirmed {
            return false;
        }

        self.state.postal_code_options.clear();
        self.state.postal_dropdown_open = false;
        self.state.postal_code_text.clear();
        self.state.error = None;

        let text = self.state.city_text.trim().to_string();

        if text.chars().any(|c| c.is_ascii_digit()) {
            self.state.city_suggestions.clear();
            self.state.error = Some(FormError::new(ErrorKind::Validation, CITY_DIGITS_MESSAGE));
            return true;
        }

        if text.chars().count() < self.settings.min_city_length {
            self.state.city_suggestions.clear();
            return true;
        }

        self.start_lookup(LookupPurpose::CitySearch, LocalityQuery::prefix_by_name(text));
        true
    }

    fn run_postal_code_search(&mut self) -> bool {
        if self.state.mode != InputMode::EditingPostalCode {
            return false;
        }

        self.state.city_text.clear();
        self.state.city_suggestions.clear();
        self.state.error = None;

        let code = self.state.postal_code_text.clone();
        let required = self.settings.postal_code_length;

        if code.len() < required {
            if !code.is_empty() {
                self.state.error = Some(FormError::new(
                    ErrorKind::Validation,
                    postal_code_length_message(required),
                ));
            }
            return true;
        }

        self.start_lookup(
            LookupPurpose::PostalCodeSearch,
            LocalityQuery::prefix_by_postal_code(code),
        );
        true
    }

    fn start_lookup(&mut self, purpose: LookupPurpose, query: LocalityQuery) {
        self.request_seq += 1;
        let request_id = self.request_seq;
        self.current_request = Some(request_id);

        tracing::debug!("🔎 Lookup #{} ({:?}): {:?}", request_id, purpose, query);

        let lookup = Arc::clone(&self.lookup);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = lookup.fetch_localities(&query).await;
            let _ = tx.send(ControllerEvent::LookupFinished {
                request_id,
                purpose,
                result,
            });
        });
    }

    fn supersede_request(&mut self) {
        if let Some(request_id) = self.current_request.take() {
            tracing::debug!("Lookup #{} superseded by new input", request_id);
        }
    }

    fn reconcile(&mut self, purpose: LookupPurpose, localities: Vec<Locality>) {
        tracing::debug!("📥 {:?} returned {} localities", purpose, localities.len());

        match purpose {
            LookupPurpose::CitySearch => {
                if localities.is_empty() {
                    self.state.clear_suggestions();
                    self.state.postal_code_text.clear();
                    self.state.error =
                        Some(FormError::new(ErrorKind::NotFound, NO_MATCHING_CITY_MESSAGE));
                } else {
                    self.state.city_suggestions = dedup_by_name(localities);
                    self.state.error = None;
                }
            }
            LookupPurpose::PostalCodeSearch => {
                let mut unique = dedup_by_name(localities);
                match unique.len() {
                    0 => {
                        self.state.city_text.clear();
                        self.state.city_suggestions.clear();
                        self.state.error =
                            Some(FormError::new(ErrorKind::NotFound, INVALID_POSTAL_CODE_MESSAGE));
                    }
                    1 => {
                        let locality = unique.remove(0);
                        self.state.city_text = locality.name;
                        self.state.city_suggestions.clear();
                        self.state.error = None;
                    }
                    _ => {
                        self.state.city_text.clear();
                        self.state.city_suggestions = unique;
                        self.state.error = None;
                    }
                }
            }
            LookupPurpose::CitySelection => {
                let selected = self.state.city_text.as_str();
                let codes = dedup_postal_codes(
                    localities
                        .iter()
                        .filter(|l| l.name == selected)
                        .map(|l| l.postal_code.as_str()),
                );

                match codes.len() {
                    0 => {
                        self.state.postal_code_options.clear();
                        self.state.postal_code_text.clear();
                        self.state.postal_dropdown_open = false;
                        self.state.error =
                            Some(FormError::new(ErrorKind::NotFound, NO_POSTAL_CODES_MESSAGE));
                    }
                    1 => {
                        self.state.postal_code_text = codes[0].clone();
                        self.state.postal_code_options.clear();
                        self.state.postal_dropdown_open = false;
                        self.state.error = None;
                    }
                    _ => {
                        self.state.postal_code_text.clear();
                        self.state.postal_code_options = codes;
                        self.state.postal_dropdown_open = true;
                        self.state.error = None;
                    }
                }
            }
        }
    }

    fn apply_failure(&mut self, purpose: LookupPurpose, err: &LookupError) {
        tracing::warn!("⚠️ {:?} lookup failed: {}", purpose, err);

        self.state.clear_suggestions();
        match purpose {
            LookupPurpose::PostalCodeSearch => self.state.city_text.clear(),
            LookupPurpose::CitySelection => self.state.postal_code_text.clear(),
            LookupPurpose::CitySearch => {}
        }
        self.state.error = Some(FormError::new(err.kind(), err.user_message(purpose.context())));
    }
}
