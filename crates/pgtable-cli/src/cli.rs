use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<A> {
    Help,
    Run(A),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrudArgs {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub table: String,
    pub primary_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestArgs {
    pub filetype: String,
    pub filepath: PathBuf,
    pub encoding: String,
}

/// Split `args` (program name first) into positionals, or `None` when help was asked for.
fn positionals(args: &[String]) -> Option<Vec<&str>> {
    let rest: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();
    if rest.is_empty() || rest.iter().any(|a| matches!(*a, "-h" | "--help")) {
        return None;
    }
    Some(rest)
}

pub fn parse_crud_args(args: &[String]) -> anyhow::Result<Command<CrudArgs>> {
    let Some(pos) = positionals(args) else {
        return Ok(Command::Help);
    };
    let [host, database, user, password, table, primary_key] = pos.as_slice() else {
        anyhow::bail!(
            "expected 6 arguments (host database user password table primary_key), got {}\n\
             Run `pgtable-crud --help` for usage.",
            pos.len()
        );
    };

    Ok(Command::Run(CrudArgs {
        host: host.to_string(),
        database: database.to_string(),
        user: user.to_string(),
        password: password.to_string(),
        table: table.to_string(),
        primary_key: primary_key.to_string(),
    }))
}

pub fn parse_ingest_args(args: &[String]) -> anyhow::Result<Command<IngestArgs>> {
    let Some(pos) = positionals(args) else {
        return Ok(Command::Help);
    };
    let [filetype, filepath, encoding] = pos.as_slice() else {
        anyhow::bail!(
            "expected 3 arguments (filetype filepath encoding), got {}\n\
             Run `pgtable-ingest --help` for usage.",
            pos.len()
        );
    };

    Ok(Command::Run(IngestArgs {
        filetype: filetype.to_string(),
        filepath: PathBuf::from(filepath),
        encoding: encoding.to_string(),
    }))
}

pub fn print_crud_help() {
    println!(
        "\
pgtable-crud - interactive CRUD operations on one PostgreSQL table

USAGE:
  pgtable-crud <HOST> <DATABASE> <USER> <PASSWORD> <TABLE> <PRIMARY_KEY>

ARGS:
  <HOST>          Database host
  <DATABASE>      Database name
  <USER>          Database user
  <PASSWORD>      Database password (use \"\" for none)
  <TABLE>         Table to operate on
  <PRIMARY_KEY>   Primary key column of <TABLE>

One operation (select, insert, update or delete) is run per invocation.
Set RUST_LOG to change log verbosity (default: info)."
    );
}

pub fn print_ingest_help() {
    println!(
        "\
pgtable-ingest - load email-validated rows from a file into PostgreSQL

USAGE:
  pgtable-ingest <FILETYPE> <FILEPATH> <ENCODING>

ARGS:
  <FILETYPE>   Source format (supported: csv)
  <FILEPATH>   Path to the source file
  <ENCODING>   Text encoding label, e.g. utf-8, latin1, windows-1252

ENVIRONMENT (also read from .env):
  PGTABLE_HOST          Database host (default: localhost)
  PGTABLE_PORT          Database port
  PGTABLE_DATABASE      Database name (default: trustpilot)
  PGTABLE_USER          Database user (default: postgres)
  PGTABLE_PASSWORD      Database password
  PGTABLE_TABLE         Destination table (default: reviews)
  PGTABLE_STAGING_DIR   Directory for the staged CSV (default: .)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_crud_positionals() {
        let cmd = parse_crud_args(&args(&[
            "pgtable-crud",
            "localhost",
            "trustpilot",
            "postgres",
            "",
            "reviews",
            "email_address",
        ]))
        .unwrap();
        let Command::Run(a) = cmd else {
            panic!("expected run");
        };
        assert_eq!(a.host, "localhost");
        assert_eq!(a.password, "");
        assert_eq!(a.table, "reviews");
        assert_eq!(a.primary_key, "email_address");
    }

    #[test]
    fn crud_wrong_arity_is_an_error() {
        let err = parse_crud_args(&args(&["pgtable-crud", "localhost"])).unwrap_err();
        assert!(err.to_string().contains("expected 6 arguments"));
    }

    #[test]
    fn help_flag_or_no_args_shows_help() {
        assert_eq!(parse_crud_args(&args(&["pgtable-crud"])).unwrap(), Command::Help);
        assert_eq!(
            parse_ingest_args(&args(&["pgtable-ingest", "csv", "--help"])).unwrap(),
            Command::Help
        );
    }

    #[test]
    fn parse_ingest_positionals() {
        let cmd = parse_ingest_args(&args(&["pgtable-ingest", "CSV", "data/reviews.csv", "latin1"]))
            .unwrap();
        assert_eq!(
            cmd,
            Command::Run(IngestArgs {
                filetype: "CSV".to_string(),
                filepath: PathBuf::from("data/reviews.csv"),
                encoding: "latin1".to_string(),
            })
        );
    }
}
