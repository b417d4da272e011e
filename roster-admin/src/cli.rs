//! Command-line interface

use anyhow::{bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use roster_common::config::{ConfigOverrides, ConsoleConfig};
use roster_common::models::{ContactDraft, DocumentDraft, LoginCredentials};
use roster_common::validation::Validate;
use roster_common::{Contact, Document, Resource};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, info};

use crate::api::{ApiClient, HttpRecordApi};
use crate::import::{DialogState, ImportDialog};
use crate::output::{CliFormatter, TableRow};
use crate::page::RecordPage;
use crate::search::filter_records;
use crate::session::{Access, Session, View};

/// Admin console for the roster contacts and documents API
#[derive(Parser, Debug)]
#[command(name = "roster-admin")]
#[command(version)]
pub struct Cli {
    /// Config file (default: <config_dir>/roster/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// API base URL, e.g. http://localhost:3000
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Folder holding the stored session
    #[arg(long, global = true, value_name = "DIR")]
    pub data_folder: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            base_url: self.base_url.clone(),
            data_folder: self.data_folder.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in to the console
    Login {
        #[arg(long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage contacts
    Contacts {
        #[command(subcommand)]
        command: ContactCommand,
    },
    /// Manage documents
    Documents {
        #[command(subcommand)]
        command: DocumentCommand,
    },
}

/// Commands shared by every collection
#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    /// Print the collection, optionally filtered
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Search as you type: one line of stdin per keystroke batch
    Watch,
    /// Delete one record
    Delete { id: String },
    /// Delete every record in the collection
    DeleteAll {
        #[arg(long)]
        confirm: bool,
    },
    /// Create records from a JSON array (`-` reads stdin)
    BulkCreate {
        file: PathBuf,
        /// Delete all existing records first
        #[arg(long)]
        replace_all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContactCommand {
    #[command(flatten)]
    Common(RecordCommand),
    /// Create a contact
    Create(ContactFields),
    /// Update a contact; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: ContactFields,
    },
    /// Upload a CSV or Excel file of contacts
    Upload {
        file: PathBuf,
        #[arg(long)]
        replace_all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocumentCommand {
    #[command(flatten)]
    Common(RecordCommand),
    /// Create a document
    Create(DocumentFields),
    /// Update a document; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: DocumentFields,
    },
    /// Fetch one document
    Get { id: String },
    /// Number of documents on the server
    Count,
    /// Server-side search
    Search { query: String },
}

#[derive(Args, Debug, Default)]
pub struct ContactFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub blood_group: Option<String>,
    #[arg(long)]
    pub lobby: Option<String>,
    #[arg(long)]
    pub designation: Option<String>,
}

impl ContactFields {
    pub fn apply(self, mut draft: ContactDraft) -> ContactDraft {
        if let Some(name) = self.name {
            draft.name = name.trim().to_string();
        }
        if let Some(phone) = self.phone {
            draft.phone = phone.trim().to_string();
        }
        if self.blood_group.is_some() {
            draft.blood_group = self.blood_group;
        }
        if self.lobby.is_some() {
            draft.lobby = self.lobby;
        }
        if self.designation.is_some() {
            draft.designation = self.designation;
        }
        draft.normalized()
    }
}

#[derive(Args, Debug, Default)]
pub struct DocumentFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub link: Option<String>,
    #[arg(long)]
    pub uploaded_by: Option<String>,
}

impl DocumentFields {
    pub fn apply(self, mut draft: DocumentDraft) -> DocumentDraft {
        if let Some(title) = self.title {
            draft.title = title.trim().to_string();
        }
        if let Some(link) = self.link {
            draft.link = link.trim().to_string();
        }
        if self.uploaded_by.is_some() {
            draft.uploaded_by = self.uploaded_by;
        }
        draft.normalized()
    }
}

// ========================================
// Command handlers
// ========================================

pub async fn run(command: Command, config: ConsoleConfig, mut session: Session) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            if let Access::Redirect(_) = session.access(View::Login) {
                print!("{}", CliFormatter::format_principal(session.principal()));
                return Ok(());
            }
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ").await?,
            };
            let principal = session
                .login(&LoginCredentials::new(username.trim(), password))
                .await?;
            print!("{}", CliFormatter::format_principal(Some(principal)));
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out");
        }
        Command::Whoami => {
            print!("{}", CliFormatter::format_principal(session.principal()));
        }
        Command::Contacts { command } => {
            session.require(View::Contacts)?;
            run_contacts(command, &config).await?;
        }
        Command::Documents { command } => {
            session.require(View::Documents)?;
            run_documents(command, &config).await?;
        }
    }
    Ok(())
}

async fn run_contacts(command: ContactCommand, config: &ConsoleConfig) -> Result<()> {
    let client = ApiClient::new(config.api.clone())?;
    let api = Arc::new(HttpRecordApi::<Contact>::new(client));
    let mut page = RecordPage::new(api, config.debounce_delay);

    match command {
        ContactCommand::Common(command) => run_common(command, &mut page, config).await,
        ContactCommand::Create(fields) => {
            let draft = fields.apply(ContactDraft::default());
            let created = page.create(&draft).await?;
            print_saved("Created", created.as_ref().map(|c| c.id.as_str()));
            Ok(())
        }
        ContactCommand::Update { id, fields } => {
            page.load().await?;
            let current = find(&page, &id)?;
            let draft = fields.apply(ContactDraft::from(current));
            page.update(&id, &draft).await?;
            print_saved("Updated", Some(&id));
            Ok(())
        }
        ContactCommand::Upload { file, replace_all } => {
            let dialog = page.import_dialog(config.import);
            let state = upload_until_done(&dialog, file, replace_all).await?;
            finish_import(&mut page, &dialog, state).await
        }
    }
}

async fn run_documents(command: DocumentCommand, config: &ConsoleConfig) -> Result<()> {
    let client = ApiClient::new(config.api.clone())?;
    let api = Arc::new(HttpRecordApi::<Document>::new(client));
    let mut page = RecordPage::new(api.clone(), config.debounce_delay);

    match command {
        DocumentCommand::Common(command) => run_common(command, &mut page, config).await,
        DocumentCommand::Create(fields) => {
            let draft = fields.apply(DocumentDraft::default());
            let created = page.create(&draft).await?;
            print_saved("Created", created.as_ref().map(|d| d.id.as_str()));
            Ok(())
        }
        DocumentCommand::Update { id, fields } => {
            let current = api
                .get(&id)
                .await?
                .with_context(|| format!("No document with id {}", id))?;
            let draft = fields.apply(DocumentDraft::from(&current));
            page.update(&id, &draft).await?;
            print_saved("Updated", Some(&id));
            Ok(())
        }
        DocumentCommand::Get { id } => {
            let document = api
                .get(&id)
                .await?
                .with_context(|| format!("No document with id {}", id))?;
            print!("{}", CliFormatter::format_table(&[&document]));
            Ok(())
        }
        DocumentCommand::Count => {
            println!("{}", api.count().await?);
            Ok(())
        }
        DocumentCommand::Search { query } => {
            let documents = api.search(&query).await?;
            let rows: Vec<&Document> = documents.iter().collect();
            print!("{}", CliFormatter::format_table(&rows));
            Ok(())
        }
    }
}

async fn run_common<R>(command: RecordCommand, page: &mut RecordPage<R>, config: &ConsoleConfig) -> Result<()>
where
    R: Resource + TableRow,
    R::Draft: Validate,
{
    match command {
        RecordCommand::List { search } => {
            let records = page.load().await?;
            let term = search.unwrap_or_default();
            print!("{}", CliFormatter::format_table(&filter_records(records, term.trim())));
        }
        RecordCommand::Watch => watch(page).await?,
        RecordCommand::Delete { id } => {
            page.delete(&id).await?;
            println!("Deleted {}", id);
        }
        RecordCommand::DeleteAll { confirm } => {
            if !confirm {
                bail!("Refusing to delete all {} without --confirm", R::KIND);
            }
            let response = page.delete_all().await?;
            print!("{}", CliFormatter::format_delete_all(&response));
        }
        RecordCommand::BulkCreate { file, replace_all } => {
            let input = read_input(&file).await?;
            let dialog = page.import_dialog(config.import);
            let state = dialog.submit_json(&input, replace_all).await;
            finish_import(page, &dialog, state).await?;
        }
    }
    Ok(())
}

/// Report the terminal state; on success wait for the auto-close refresh
async fn finish_import<R>(page: &mut RecordPage<R>, dialog: &ImportDialog<R>, state: DialogState) -> Result<()>
where
    R: Resource + TableRow,
    R::Draft: Validate,
{
    if let DialogState::Failed(failure) = &state {
        bail!("{}", failure.message);
    }
    print!(
        "{}",
        CliFormatter::format_dialog_state(&state, dialog.settings().visible_errors)
    );

    if let DialogState::Success(_) = state {
        dialog.closed().await;
    }
    if page.apply_refreshes().await? {
        println!("{} now holds {} record(s)", R::KIND.title(), page.records().len());
    }
    dialog.teardown();
    Ok(())
}

/// Run the upload in the background so Ctrl+C can abandon it
async fn upload_until_done(
    dialog: &ImportDialog<Contact>,
    file: PathBuf,
    replace_all: bool,
) -> Result<DialogState> {
    let task = {
        let dialog = dialog.clone();
        tokio::spawn(async move { dialog.submit_file(Some(&file), replace_all).await })
    };

    tokio::select! {
        state = task => Ok(state.context("Upload task failed")?),
        _ = tokio::signal::ctrl_c() => {
            dialog.cancel_upload();
            Ok(dialog.state())
        }
    }
}

/// Search-as-you-type over stdin
///
/// Each line replaces the search input; an empty line clears it. The
/// filtered table is printed whenever the debounced term changes.
async fn watch<R>(page: &mut RecordPage<R>) -> Result<()>
where
    R: Resource + TableRow,
    R::Draft: Validate,
{
    page.load().await?;
    print!("{}", CliFormatter::format_table(&page.filtered()));
    eprintln!(
        "Type to search {} (debounce {} ms), Ctrl+D to quit",
        R::KIND,
        page.search().delay().as_millis()
    );

    let mut updates = page.search().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    debug!(input = %line, "Search input");
                    page.search_mut().set_raw(line.trim());
                }
                None => break,
            },
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let term = updates.borrow_and_update().clone();
                println!("\nSearch: {:?}", term);
                print!("{}", CliFormatter::format_table(&page.filtered()));
            }
        }
    }

    page.search_mut().teardown();
    info!(kind = %R::KIND, "Watch ended");
    Ok(())
}

fn find<'a, R: Resource>(page: &'a RecordPage<R>, id: &str) -> Result<&'a R>
where
    R::Draft: Validate,
{
    page.records()
        .iter()
        .find(|r| r.id() == id)
        .with_context(|| format!("No {} with id {}", R::KIND.entity().to_lowercase(), id))
}

fn print_saved(verb: &str, id: Option<&str>) {
    match id {
        Some(id) => println!("{} {}", verb, id),
        None => println!("{}", verb),
    }
}

async fn read_input(file: &PathBuf) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        return Ok(input);
    }
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

async fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    Ok(lines.next_line().await?.unwrap_or_default())
}
