//! Interactive single-operation CRUD session.
//!
//! The session walks a small state machine:
//!
//! ```text
//! AwaitingOperation ──select/insert/update/delete──▶ <operation> ──▶ Done
//!         │
//!         └──────────────── anything else ─────────────────────────▶ Done
//! ```
//!
//! Input problems the user can fix on the next run (bad identifiers, empty
//! payloads) are logged and the operation is skipped. Connection, execution and
//! console errors end the session with an error.

use crate::prompt::Prompt;
use crate::render::render_records;
use pgtable::{
    Assignments, EMAIL_COLUMN, Filter, Gateway, Projection, QueryBuilder, Record, TableResult,
    is_valid_email,
};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShellState {
    AwaitingOperation,
    Select,
    Insert,
    Update,
    Delete,
    Done,
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Column whose values must pass email validation on insert.
    pub email_field: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            email_field: EMAIL_COLUMN.to_string(),
        }
    }
}

pub struct Shell<G, P> {
    gateway: G,
    prompt: P,
    builder: QueryBuilder,
    config: ShellConfig,
}

impl<G: Gateway, P: Prompt> Shell<G, P> {
    pub fn new(gateway: G, prompt: P, builder: QueryBuilder) -> Self {
        Self {
            gateway,
            prompt,
            builder,
            config: ShellConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ShellConfig) -> Self {
        self.config = config;
        self
    }

    pub fn into_parts(self) -> (G, P) {
        (self.gateway, self.prompt)
    }

    /// Run one operation chosen by the user.
    pub async fn run(&mut self) -> TableResult<()> {
        let mut state = ShellState::AwaitingOperation;
        loop {
            state = match state {
                ShellState::AwaitingOperation => self.choose_operation()?,
                ShellState::Done => return Ok(()),
                op => {
                    if let Err(err) = self.run_operation(op).await {
                        if !err.is_recoverable() {
                            return Err(err);
                        }
                        tracing::warn!("{err}; operation skipped");
                    }
                    ShellState::Done
                }
            };
        }
    }

    fn choose_operation(&mut self) -> TableResult<ShellState> {
        let op = self
            .prompt
            .ask("Enter the operation type i.e. select, update, insert, delete: ")?
            .trim()
            .to_lowercase();
        Ok(match op.as_str() {
            "select" => ShellState::Select,
            "insert" => ShellState::Insert,
            "update" => ShellState::Update,
            "delete" => ShellState::Delete,
            other => {
                tracing::warn!("unknown operation '{other}'");
                ShellState::Done
            }
        })
    }

    async fn run_operation(&mut self, state: ShellState) -> TableResult<()> {
        match state {
            ShellState::Select => self.select().await,
            ShellState::Insert => self.insert().await,
            ShellState::Update => self.update().await,
            ShellState::Delete => self.delete().await,
            ShellState::AwaitingOperation | ShellState::Done => Ok(()),
        }
    }

    async fn select(&mut self) -> TableResult<()> {
        let columns = self
            .prompt
            .ask("Enter columns to select separated by commas(or leave blank to select all): ")?
            .trim()
            .to_lowercase();
        let projection = Projection::parse(&columns)?;

        let field = self
            .prompt
            .ask("Enter field name to filter by(or leave blank for no filter): ")?
            .trim()
            .to_string();
        let filter = if field.is_empty() {
            tracing::info!("Selecting data with no filter applied");
            None
        } else {
            let value = self.prompt.ask(&format!("Enter value for {field}: "))?;
            tracing::info!("Selecting data with condition {field} = {value}");
            Some(Filter::new(field.as_str(), value)?)
        };

        let rows = self
            .gateway
            .select(&self.builder.build_select(projection, filter))
            .await?;
        tracing::info!(rows = rows.len(), "select complete");
        self.prompt.say(&render_records(&rows))?;
        Ok(())
    }

    async fn insert(&mut self) -> TableResult<()> {
        self.prompt
            .say("Enter field, value pairs to insert(leave blank when done).")?;
        let mut values = Assignments::new();
        loop {
            let field = self.prompt.ask("Enter field to insert: ")?.trim().to_string();
            if field.is_empty() {
                break;
            }
            let mut value = self.prompt.ask(&format!("Enter value for {field}: "))?;
            if field == self.config.email_field {
                while !is_valid_email(&value) {
                    tracing::warn!("Invalid value for email address. Please enter valid value.");
                    value = self.prompt.ask(&format!("Enter value for {field}: "))?;
                }
            }
            values.set(field.as_str(), value)?;
        }

        if values.is_empty() {
            tracing::info!("No data provided for insert operation");
            return Ok(());
        }

        let rows = self
            .gateway
            .insert(&self.builder.build_insert(&values)?)
            .await?;
        self.report("Inserted record", &rows)
    }

    async fn update(&mut self) -> TableResult<()> {
        let key = self.prompt.ask(&format!(
            "Enter {} value for record to update: ",
            self.builder.primary_key().name()
        ))?;
        self.prompt
            .say("Enter field, value pairs to update(leave blank when done).")?;
        let mut values = Assignments::new();
        loop {
            let field = self.prompt.ask("Enter field to update: ")?.trim().to_string();
            if field.is_empty() {
                break;
            }
            let value = self.prompt.ask(&format!("Enter value for {field}: "))?;
            values.set(field.as_str(), value)?;
        }

        if key.is_empty() || values.is_empty() {
            tracing::info!("No data provided for update operation");
            return Ok(());
        }

        let rows = self
            .gateway
            .update(&self.builder.build_update(&values, key)?)
            .await?;
        self.report("Record updated", &rows)
    }

    async fn delete(&mut self) -> TableResult<()> {
        self.prompt.say("Choose your option")?;
        self.prompt.say("1: Delete specific records")?;
        self.prompt.say("2: Delete all records")?;
        let choice = self.prompt.ask("Provide your input: ")?;

        match choice.trim() {
            "1" => self.delete_matching().await,
            "2" => self.delete_all().await,
            other => {
                tracing::warn!("Invalid choice '{other}'");
                Ok(())
            }
        }
    }

    async fn delete_matching(&mut self) -> TableResult<()> {
        let field = self
            .prompt
            .ask("Enter field name for where clause condition: ")?
            .trim()
            .to_string();
        let value = self
            .prompt
            .ask(&format!("Enter value for {field}: "))?
            .trim()
            .to_string();
        if field.is_empty() || value.is_empty() {
            tracing::info!("No condition provided for delete operation");
            return Ok(());
        }

        let confirm = self.prompt.ask(&format!(
            "Do you want to delete records where {field} = {value}? (yes/no): "
        ))?;
        if !confirm.trim().eq_ignore_ascii_case("yes") {
            tracing::info!("Delete operation cancelled");
            return Ok(());
        }

        let filter = Filter::new(field.as_str(), value)?;
        let rows = self
            .gateway
            .delete(&self.builder.build_delete(Some(filter)))
            .await?;
        self.report("Deleted records", &rows)
    }

    async fn delete_all(&mut self) -> TableResult<()> {
        let table = self.builder.table().name().to_string();
        let confirm = self.prompt.ask(&format!(
            "Are you sure you want to delete all records from {table}? (yes/no): "
        ))?;
        // Exact match: no trimming, no case folding.
        if confirm != "yes" {
            tracing::info!("Delete operation cancelled");
            return Ok(());
        }

        self.gateway.delete(&self.builder.build_delete(None)).await?;
        tracing::info!("All records deleted from {table}");
        Ok(())
    }

    fn report(&mut self, what: &str, rows: &[Record]) -> TableResult<()> {
        tracing::info!(rows = rows.len(), "{what}");
        for row in rows {
            tracing::info!(%row);
        }
        self.prompt.say(&render_records(rows))?;
        Ok(())
    }
}
