//! Interactive admin shell hosting one record table at a time.

mod command;
mod view;

pub use command::*;
pub use view::*;

use std::future::Future;
use std::io;
use std::io::Write;
use std::sync::Arc;

use cms_lib::DataClient;
use cms_lib::api::MemoryBackend;
use cms_lib::api::ModelApi;
use cms_lib::dashboard::DASHBOARD_ENTITIES;
use cms_lib::dashboard::entity_stats;
use cms_lib::error::Error;
use cms_lib::model::EntityKind;
use cms_lib::table::FieldRenderer;
use cms_lib::table::GenericRecordTable;
use cms_lib::table::Prompt;
use cms_lib::table::RemoveOutcome;
use cms_lib::table::TableConfig;
use cms_lib::table::TableState;

use crate::settings::Pref;
use crate::settings::SettingsError;
use crate::settings::SettingsProvider;

/// Where records come from.
#[derive(Clone)]
pub enum Source {
    Remote(DataClient),
    Memory(MemoryBackend),
}

impl Source {
    pub fn model(&self, entity: EntityKind) -> Arc<dyn ModelApi> {
        match self {
            Source::Remote(client) => Arc::new(client.model(entity)),
            Source::Memory(backend) => Arc::new(backend.model(entity)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Source::Remote(client) => client.url().to_string(),
            Source::Memory(_) => "in-memory store".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Table(#[from] Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Whether the shell keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<W: Write> {
    source: Source,
    prompt: Arc<dyn Prompt>,
    settings: SettingsProvider,
    renderer: FieldRenderer,
    table: GenericRecordTable,
    out: W,
}

impl<W: Write> Shell<W> {
    /// Opens the table for `entity` and loads it.
    pub async fn open(
        source: Source,
        prompt: Arc<dyn Prompt>,
        settings: SettingsProvider,
        renderer: FieldRenderer,
        entity: EntityKind,
        page_size: usize,
        out: W,
    ) -> Result<Self, ShellError> {
        let table = bind(&source, &prompt, &renderer, entity, page_size)?;
        let mut shell = Self {
            source,
            prompt,
            settings,
            renderer,
            table,
            out,
        };
        shell.load().await?;
        Ok(shell)
    }

    /// Reads and runs commands until `quit` or end of input.
    ///
    /// `read_line` resolves to `None` at end of input. Errors from single
    /// commands are reported on stderr and do not stop the loop.
    pub async fn run<F, Fut>(&mut self, mut read_line: F) -> Result<(), ShellError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = io::Result<Option<String>>>,
    {
        self.print_page()?;

        loop {
            write!(self.out, "{}> ", self.table.config().title().to_ascii_lowercase())?;
            self.out.flush()?;

            let Some(line) = read_line().await? else {
                writeln!(self.out)?;
                return Ok(());
            };
            if line.trim().is_empty() {
                continue;
            }

            let result = match line.parse::<Command>() {
                Ok(command) => self.execute(command).await,
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(ShellError::Io(e)) => return Err(ShellError::Io(e)),
                Err(e) => {
                    log::debug!("Command '{}' failed: {}", line.trim(), e);
                    eprintln!("error: {}", e);
                }
            }
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<Flow, ShellError> {
        match command {
            Command::List => self.print_page()?,
            Command::Search(term) => {
                self.table.set_search(term);
                self.print_page()?;
            }
            Command::Page(page) => {
                self.table.go_to_page(page);
                self.print_page()?;
            }
            Command::Next => {
                self.table.next_page();
                self.print_page()?;
            }
            Command::Prev => {
                self.table.previous_page();
                self.print_page()?;
            }
            Command::Size(size) => {
                self.table.set_page_size(size);
                self.remember(Pref::PageSize, &self.table.page_size()).await;
                self.print_page()?;
            }
            Command::Use(entity) => {
                self.table = bind(
                    &self.source,
                    &self.prompt,
                    &self.renderer,
                    entity,
                    self.table.page_size(),
                )?;
                self.remember(Pref::LastEntity, &entity.model_name().to_string()).await;
                self.load().await?;
                self.print_page()?;
            }
            Command::Reload => {
                self.load().await?;
                self.print_page()?;
            }
            Command::New => {
                self.table.open_create();
                self.print_form()?;
            }
            Command::Edit(id) => {
                self.table.open_edit_by_id(&id)?;
                self.print_form()?;
            }
            Command::Form => self.print_form()?,
            Command::Set(key, value) => {
                self.table.set_input(&key, &value)?;
                self.print_form()?;
            }
            Command::Save => match self.table.submit().await {
                Ok(()) => {
                    writeln!(self.out, "Saved.")?;
                    self.print_page()?;
                }
                // Already alerted; the form stays open.
                Err(e) if self.table.editor().is_some() => {
                    log::debug!("Save failed: {}", e);
                    self.print_form()?;
                }
                Err(e) => return Err(e.into()),
            },
            Command::Cancel => {
                self.table.cancel_edit();
                self.print_page()?;
            }
            Command::Delete(id) => match self.table.remove(&id).await {
                Ok(RemoveOutcome::Deleted) => {
                    writeln!(self.out, "Deleted.")?;
                    self.print_page()?;
                }
                Ok(RemoveOutcome::Cancelled) => writeln!(self.out, "Cancelled.")?,
                Err(e) => log::debug!("Delete failed: {}", e),
            },
            Command::Entities => {
                let current = self.table.config().entity();
                for entity in EntityKind::ALL {
                    let marker = if entity == current { "*" } else { " " };
                    writeln!(self.out, "{} {:<14} {}", marker, entity.model_name(), entity.plural_name())?;
                }
            }
            Command::Dashboard => self.print_dashboard().await?,
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Loads the table, reporting a failure without aborting the shell.
    async fn load(&mut self) -> Result<(), ShellError> {
        if let Err(e) = self.table.load().await {
            writeln!(self.out, "Failed to load {}: {}", self.table.config().title(), e)?;
        }
        Ok(())
    }

    async fn remember<T: serde::Serialize + Sync>(&self, pref: Pref, value: &T) {
        if let Err(e) = self.settings.set(pref, value).await {
            log::warn!("Failed to save preference {}: {}", pref, e);
        }
    }

    async fn print_dashboard(&mut self) -> Result<(), ShellError> {
        let source = &self.source;
        let stats = entity_stats(&DASHBOARD_ENTITIES, |entity| source.model(entity)).await;

        let rows: Vec<Vec<String>> = stats
            .iter()
            .map(|s| vec![s.entity.plural_name().to_string(), s.display_count()])
            .collect();

        writeln!(self.out, "Admin Dashboard ({})", self.source.describe())?;
        write!(self.out, "{}", render_table(&["table", "records"], &rows))?;
        Ok(())
    }

    fn print_page(&mut self) -> Result<(), ShellError> {
        let config = self.table.config();
        let view = self.table.page_view();

        writeln!(self.out, "{} ({})", config.title(), self.source.describe())?;
        if self.table.state() == TableState::Failed {
            writeln!(
                self.out,
                "Showing cached records; last load failed: {}",
                self.table.load_error().unwrap_or("unknown error")
            )?;
        }
        if !self.table.search_term().is_empty() {
            writeln!(self.out, "Search: {}", self.table.search_term())?;
        }

        let rows: Vec<Vec<String>> = view.items.iter().map(|r| self.table.render_row(r)).collect();
        write!(self.out, "{}", render_table(&self.table.header(), &rows))?;

        writeln!(
            self.out,
            "{}  (page {} of {})",
            view.summary(),
            view.page,
            view.total_pages.max(1)
        )?;
        Ok(())
    }

    fn print_form(&mut self) -> Result<(), ShellError> {
        let Some(editor) = self.table.editor() else {
            writeln!(self.out, "No form is open. Use 'new' or 'edit <id>'.")?;
            return Ok(());
        };

        let title = match editor.mode.id() {
            Some(id) => format!("Edit {} {}", self.table.config().record_label(), id),
            None => format!("New {}", self.table.config().record_label()),
        };
        let error = editor.error.clone();
        let form = render_form(&title, &self.table.form_controls());

        write!(self.out, "{}", form)?;
        if let Some(error) = error {
            writeln!(self.out, "Last save failed: {}", error)?;
        }
        writeln!(self.out, "Use 'set <field> <value>', then 'save' or 'cancel'.")?;
        Ok(())
    }
}

#[cfg(test)]
impl<W: Write> Shell<W> {
    pub fn table(&self) -> &GenericRecordTable {
        &self.table
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

fn bind(
    source: &Source,
    prompt: &Arc<dyn Prompt>,
    renderer: &FieldRenderer,
    entity: EntityKind,
    page_size: usize,
) -> Result<GenericRecordTable, ShellError> {
    let config = TableConfig::for_entity(entity).map_err(Error::from)?;
    let table = GenericRecordTable::new(config, source.model(entity), Arc::clone(prompt))?
        .with_renderer(renderer.clone())
        .with_page_size(page_size);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use cms_lib::table::AutoConfirm;

    use super::*;
    use crate::settings::MemoryPrefs;

    async fn shell(entity: EntityKind) -> (Shell<Vec<u8>>, SettingsProvider) {
        let settings = SettingsProvider::new(MemoryPrefs::new());
        let shell = Shell::open(
            Source::Memory(MemoryBackend::new()),
            Arc::new(AutoConfirm),
            settings.clone(),
            FieldRenderer::utc(),
            entity,
            10,
            Vec::new(),
        )
        .await
        .unwrap();
        (shell, settings)
    }

    fn text(shell: &Shell<Vec<u8>>) -> String {
        String::from_utf8_lossy(shell.output()).to_string()
    }

    async fn run_lines(shell: &mut Shell<Vec<u8>>, lines: &[&str]) {
        let mut lines = lines.iter().map(|l| l.to_string()).collect::<Vec<_>>().into_iter();
        shell
            .run(move || std::future::ready(Ok(lines.next())))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (mut shell, _) = shell(EntityKind::Tag).await;
        run_lines(
            &mut shell,
            &["new", "set name Rock", "set slug rock", "set color #FF6B6B", "save", "quit"],
        )
        .await;

        assert_eq!(shell.table().records().len(), 1);
        let out = text(&shell);
        assert!(out.contains("Saved."));
        assert!(out.contains("● #FF6B6B"));
        assert!(out.contains("Showing 1 to 1 of 1 results"));
    }

    #[tokio::test]
    async fn test_bad_input_keeps_running() {
        let (mut shell, _) = shell(EntityKind::Post).await;
        run_lines(&mut shell, &["frobnicate", "new", "set status LIVE", "set title Hello", "form"]).await;

        let editor = shell.table().editor().unwrap();
        assert_eq!(editor.draft.value("title").as_str(), Some("Hello"));
        assert!(editor.draft.value("status").is_null());
    }

    #[tokio::test]
    async fn test_use_and_size_are_remembered() {
        let (mut shell, settings) = shell(EntityKind::Tag).await;

        shell.execute(Command::Use(EntityKind::Todo)).await.unwrap();
        shell.execute(Command::Size(3)).await.unwrap();

        assert_eq!(shell.table().config().entity(), EntityKind::Todo);
        assert_eq!(shell.table().page_size(), 3);
        assert_eq!(settings.get::<String>(Pref::LastEntity).await.unwrap().as_deref(), Some("Todo"));
        assert_eq!(settings.get::<usize>(Pref::PageSize).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_delete_through_shell() {
        let (mut shell, _) = shell(EntityKind::Todo).await;
        run_lines(&mut shell, &["new", "set content Buy milk", "save"]).await;
        let id = shell.table().records()[0].id().unwrap().to_string();

        let flow = shell.execute(Command::Delete(id)).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(shell.table().records().is_empty());
        assert!(text(&shell).contains("Deleted."));
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let (mut shell, _) = shell(EntityKind::Tag).await;
        run_lines(&mut shell, &["new", "set name Rock", "set slug rock", "save", "dashboard"]).await;

        let out = text(&shell);
        let dashboard = &out[out.find("Admin Dashboard").unwrap()..];
        let line = |name: &str| {
            dashboard
                .lines()
                .find(|l| l.starts_with(name))
                .map(|l| l.split_whitespace().filter(|w| *w != "|").collect::<Vec<_>>())
                .unwrap()
        };

        assert_eq!(line("Tags"), vec!["Tags", "1"]);
        assert_eq!(line("Users"), vec!["Users", "0"]);
        assert!(!dashboard.contains("PostTags"));
    }

    #[tokio::test]
    async fn test_edit_unknown_id_is_an_error() {
        let (mut shell, _) = shell(EntityKind::Tag).await;
        let err = shell.execute(Command::Edit("missing".into())).await.unwrap_err();
        assert!(matches!(err, ShellError::Table(Error::NotFound { .. })));
    }
}
