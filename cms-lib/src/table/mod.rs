//! Configuration-driven record table
//!
//! [`GenericRecordTable`] binds one [`TableConfig`] to a [`ModelApi`] and keeps
//! a local cache of the model's records. Search and pagination run over the
//! cache; every successful mutation reloads it in full.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cms_lib::api::MemoryBackend;
//! use cms_lib::model::EntityKind;
//! use cms_lib::table::{AutoConfirm, GenericRecordTable, TableConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = MemoryBackend::new();
//! let config = TableConfig::for_entity(EntityKind::Tag).unwrap();
//! let mut table = GenericRecordTable::new(
//!     config,
//!     Arc::new(backend.model(EntityKind::Tag)),
//!     Arc::new(AutoConfirm),
//! )
//! .unwrap();
//!
//! table.open_create();
//! table.set_input("name", "Rock").unwrap();
//! table.set_input("slug", "rock").unwrap();
//! table.submit().await.unwrap();
//!
//! assert_eq!(table.records().len(), 1);
//! # }
//! ```

mod config;
mod draft;
mod page;
mod presets;
mod prompt;
mod render;
mod search;
mod state;

pub use config::*;
pub use draft::*;
pub use page::*;
pub use presets::PLACEHOLDER;
pub use prompt::*;
pub use render::*;
pub use search::*;
pub use state::*;

use std::sync::Arc;

use crate::api::ModelApi;
use crate::error::ConfigError;
use crate::error::Error;
use crate::model::ID_FIELD;
use crate::model::Record;
use crate::model::Value;

/// Confirmation shown before a delete.
pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this item?";
/// Alert shown when create or update fails.
pub const SAVE_FAILED: &str = "Error saving item";
/// Alert shown when delete fails.
pub const DELETE_FAILED: &str = "Error deleting item";

/// A list/search/paginate/create/update/delete view over one model.
///
/// All handlers take `&mut self`, so a single owner drives the table one
/// operation at a time. Loads can still be split with
/// [`begin_load`](Self::begin_load)/[`finish_load`](Self::finish_load) when
/// the caller runs the request elsewhere.
pub struct GenericRecordTable {
    config: TableConfig,
    api: Arc<dyn ModelApi>,
    prompt: Arc<dyn Prompt>,
    renderer: FieldRenderer,

    records: Vec<Record>,
    load_state: TableState,
    load_error: Option<String>,
    issued: u64,
    applied: u64,

    search_term: String,
    page: usize,
    page_size: usize,

    editor: Option<Editor>,
}

impl GenericRecordTable {
    /// Binds a table configuration to a model handle.
    ///
    /// Fails when the handle serves a different entity than the table shows.
    pub fn new(
        config: TableConfig,
        api: Arc<dyn ModelApi>,
        prompt: Arc<dyn Prompt>,
    ) -> Result<Self, Error> {
        if api.entity() != config.entity() {
            return Err(ConfigError::EntityMismatch {
                table: config.model_name(),
                served: api.entity().model_name(),
            }
            .into());
        }

        Ok(Self {
            config,
            api,
            prompt,
            renderer: FieldRenderer::default(),
            records: Vec::new(),
            load_state: TableState::Idle,
            load_error: None,
            issued: 0,
            applied: 0,
            search_term: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            editor: None,
        })
    }

    /// Replaces the cell renderer.
    pub fn with_renderer(mut self, renderer: FieldRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Sets the page size. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.set_page_size(page_size);
        self
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn renderer(&self) -> &FieldRenderer {
        &self.renderer
    }

    /// Cached records in API order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn state(&self) -> TableState {
        if self.editor.is_some() {
            TableState::Editing
        } else {
            self.load_state
        }
    }

    /// Message of the last failed load, cleared by the next success.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetches every record and replaces the cache.
    ///
    /// On failure the cache is left as it was and the table enters
    /// [`TableState::Failed`]. There is no retry.
    pub async fn load(&mut self) -> Result<LoadOutcome, Error> {
        let ticket = self.begin_load();
        let result = self.api.list().await;
        self.finish_load(ticket, result)
    }

    /// Marks a load as started and returns its ticket.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.load_state = TableState::Loading;
        LoadTicket(self.issued)
    }

    /// Applies the result of the load identified by `ticket`.
    ///
    /// Results older than the newest applied load are dropped, errors
    /// included.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Record>, Error>,
    ) -> Result<LoadOutcome, Error> {
        if ticket.0 < self.applied {
            log::debug!(
                "Dropping stale {} load #{} (newest applied #{})",
                self.config.entity(),
                ticket.0,
                self.applied
            );
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(records) => {
                log::debug!("Loaded {} {} records", records.len(), self.config.entity());
                self.records = records;
                self.applied = ticket.0;
                self.load_state = TableState::Ready;
                self.load_error = None;
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                log::error!("Error fetching {} records: {}", self.config.entity(), e);
                self.load_state = TableState::Failed;
                self.load_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // =========================================================================
    // Search and pagination
    // =========================================================================

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Sets the search term and returns to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    /// Cached records matching the search term, in cache order.
    pub fn filtered(&self) -> Vec<&Record> {
        search(&self.records, self.config.search_fields(), &self.search_term)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// The current page of filtered records.
    pub fn page_view(&self) -> PageView<&Record> {
        paginate(&self.filtered(), self.page, self.page_size)
    }

    /// Current page, clamped to the filtered result.
    pub fn page(&self) -> usize {
        clamp_page(self.page, self.total_pages())
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    /// Jumps to a page, clamped to `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.page = clamp_page(page, self.total_pages());
        self.page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to_page(self.page() + 1)
    }

    pub fn previous_page(&mut self) -> usize {
        self.go_to_page(self.page().saturating_sub(1))
    }

    /// Column headers in field order.
    pub fn header(&self) -> Vec<&str> {
        self.config.fields().iter().map(|f| f.label.as_str()).collect()
    }

    /// Rendered cells of the current page, one row per record.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.page_view()
            .items
            .into_iter()
            .map(|record| self.render_row(record))
            .collect()
    }

    /// Rendered cells for one record.
    pub fn render_row(&self, record: &Record) -> Vec<String> {
        self.config
            .fields()
            .iter()
            .map(|f| self.renderer.render_field(f, record.value(&f.key), record))
            .collect()
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn editor(&self) -> Option<&Editor> {
        self.editor.as_ref()
    }

    /// Opens an empty create form, discarding any open form.
    pub fn open_create(&mut self) {
        self.editor = Some(Editor::new(EditMode::Create, Draft::new()));
    }

    /// Opens the edit form for `record`.
    pub fn open_edit(&mut self, record: &Record) -> Result<(), Error> {
        let id = record
            .id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::validation(ID_FIELD, "record has no id"))?;
        self.editor = Some(Editor::new(
            EditMode::Update { id: id.to_string() },
            Draft::from_record(record),
        ));
        Ok(())
    }

    /// Opens the edit form for a cached record.
    pub fn open_edit_by_id(&mut self, id: &str) -> Result<(), Error> {
        let record = self
            .records
            .iter()
            .find(|r| r.id() == Some(id))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                entity: self.config.model_name().to_string(),
                id: id.to_string(),
            })?;
        self.open_edit(&record)
    }

    /// Closes the form without saving.
    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    /// Direct access to the open draft.
    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.editor.as_mut().map(|e| &mut e.draft)
    }

    /// Parses raw control text into the draft field `key`.
    pub fn set_input(&mut self, key: &str, raw: &str) -> Result<(), Error> {
        let editor = self
            .editor
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no form is open".into()))?;
        let editing = editor.mode.is_update();

        let field = self
            .config
            .form_fields(editing)
            .find(|f| f.key == key)
            .ok_or_else(|| Error::validation(key, "not an editable field"))?;
        if field.key == ID_FIELD {
            return Err(Error::validation(key, "read-only"));
        }

        editor.draft.set_input(field, raw)
    }

    /// Controls of the open form, in field order.
    pub fn form_controls(&self) -> Vec<InputControl> {
        let Some(editor) = &self.editor else {
            return Vec::new();
        };
        let editing = editor.mode.is_update();

        self.config
            .form_fields(editing)
            .map(|field| {
                let value = match (&editor.mode, field.key.as_str()) {
                    (EditMode::Update { id }, ID_FIELD) => Value::String(id.clone()),
                    _ => editor.draft.value(&field.key).clone(),
                };
                self.renderer.render_input(field, &value, editing)
            })
            .collect()
    }

    /// Sends the open draft.
    ///
    /// Creating strips system fields; editing sends the draft with the
    /// record's id. Success closes the form and reloads. Failure raises a
    /// blocking alert and leaves the form open with the draft intact.
    pub async fn submit(&mut self) -> Result<(), Error> {
        let api = Arc::clone(&self.api);
        let editor = self
            .editor
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no form is open".into()))?;
        editor.error = None;

        let missing = editor
            .draft
            .missing_required(&self.config, editor.mode.is_update());
        if !missing.is_empty() {
            let err = Error::Validation(missing);
            editor.error = Some(err.to_string());
            self.prompt.alert(&err.to_string());
            return Err(err);
        }

        let payload = editor.draft.record().without_system_fields();
        let result = match &editor.mode {
            EditMode::Create => api.create(payload).await,
            EditMode::Update { id } => {
                let mut payload = payload;
                payload.insert(ID_FIELD, id.clone());
                api.update(payload).await
            }
        };

        match result {
            Ok(saved) => {
                log::info!(
                    "Saved {} {}",
                    self.config.entity(),
                    saved.as_ref().and_then(|r| r.id()).unwrap_or("(no echo)")
                );
                self.editor = None;
                self.reload_after_mutation().await;
                Ok(())
            }
            Err(e) => {
                log::error!("Error saving {}: {}", self.config.entity(), e);
                editor.error = Some(e.to_string());
                self.prompt.alert(SAVE_FAILED);
                Err(e)
            }
        }
    }

    /// Deletes a record after a blocking confirmation.
    pub async fn remove(&mut self, id: &str) -> Result<RemoveOutcome, Error> {
        if !self.prompt.confirm(DELETE_CONFIRMATION) {
            return Ok(RemoveOutcome::Cancelled);
        }

        match self.api.delete(id).await {
            Ok(()) => {
                log::info!("Deleted {} {}", self.config.entity(), id);
                self.reload_after_mutation().await;
                Ok(RemoveOutcome::Deleted)
            }
            Err(e) => {
                log::error!("Error deleting {} {}: {}", self.config.entity(), id, e);
                self.prompt.alert(DELETE_FAILED);
                Err(e)
            }
        }
    }

    // The mutation already succeeded; a failed reload only shows up in state.
    async fn reload_after_mutation(&mut self) {
        if let Err(e) = self.load().await {
            log::warn!("Reload after mutation failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::model::EntityKind;

    fn tag_table(backend: &MemoryBackend) -> GenericRecordTable {
        GenericRecordTable::new(
            TableConfig::for_entity(EntityKind::Tag).unwrap(),
            Arc::new(backend.model(EntityKind::Tag)),
            Arc::new(AutoConfirm),
        )
        .unwrap()
        .with_renderer(FieldRenderer::utc())
    }

    #[test]
    fn test_entity_mismatch_rejected() {
        let backend = MemoryBackend::new();
        let result = GenericRecordTable::new(
            TableConfig::for_entity(EntityKind::Tag).unwrap(),
            Arc::new(backend.model(EntityKind::Post)),
            Arc::new(AutoConfirm),
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::EntityMismatch { table: "Tag", served: "Post" }))
        ));
    }

    #[test]
    fn test_stale_load_dropped() {
        let backend = MemoryBackend::new();
        let mut table = tag_table(&backend);

        let first = table.begin_load();
        let second = table.begin_load();

        let newer = vec![Record::with_id("b").set("name", "New")];
        let older = vec![Record::with_id("a").set("name", "Old")];

        assert_eq!(table.finish_load(second, Ok(newer.clone())).unwrap(), LoadOutcome::Applied);
        assert_eq!(table.finish_load(first, Ok(older)).unwrap(), LoadOutcome::Stale);
        assert_eq!(table.records(), newer.as_slice());
        assert_eq!(table.state(), TableState::Ready);
    }

    #[test]
    fn test_paging_clamps() {
        let backend = MemoryBackend::new();
        let mut table = tag_table(&backend).with_page_size(2);
        let ticket = table.begin_load();
        let records: Vec<Record> = (0..5)
            .map(|i| Record::with_id(i.to_string()).set("name", format!("t{}", i)))
            .collect();
        table.finish_load(ticket, Ok(records)).unwrap();

        assert_eq!(table.total_pages(), 3);
        assert_eq!(table.previous_page(), 1);
        assert_eq!(table.go_to_page(99), 3);
        assert_eq!(table.next_page(), 3);
        assert_eq!(table.rows().len(), 1);

        table.set_search("t1");
        assert_eq!(table.page(), 1);
        assert_eq!(table.page_view().total, 1);
    }

    #[test]
    fn test_id_is_read_only_when_editing() {
        let backend = MemoryBackend::new();
        let mut table = tag_table(&backend);
        table
            .open_edit(&Record::with_id("abc123").set("name", "Rock"))
            .unwrap();

        assert!(table.set_input("id", "other").is_err());
        assert!(table.set_input("createdAt", "2024-01-01T00:00").is_err());

        let controls = table.form_controls();
        assert_eq!(controls[0].key, "id");
        assert!(controls[0].read_only);
        assert_eq!(controls[0].display_value(), "abc123");
    }

    #[tokio::test]
    async fn test_submit_without_form() {
        let backend = MemoryBackend::new();
        let mut table = tag_table(&backend);
        assert!(matches!(table.submit().await, Err(Error::InvalidState(_))));
    }
}
