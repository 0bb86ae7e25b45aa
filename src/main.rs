//! RVT2 analyzer - Entry Point

use clap::{Parser, Subcommand};
use rvt2_analyzer::client::{ElasticClient, HttpTransport, Transport};
use rvt2_analyzer::config::{self, LocalStore, ResolvedConfig};
use rvt2_analyzer::files::FilesClient;
use rvt2_analyzer::model::{AppError, IndexName, NotificationKind, QueryType, SearchQuery, Sort, SourceFields};
use rvt2_analyzer::state::{
    CaseStore, Dispatcher, MessageBus, Outcome, RootState, SearchSettings, SearchState, SourceStore,
};
use rvt2_analyzer::view;
use std::path::PathBuf;
use tracing::info;

/// RVT2 analyzer - search, tag and browse forensic cases stored in ElasticSearch
#[derive(Parser, Debug)]
#[command(name = "rvt2-analyzer")]
#[command(version)]
#[command(about = "Search, tag and browse RVT2 forensic cases stored in ElasticSearch")]
pub struct Args {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// ElasticSearch server for this run (overrides the saved one)
    #[arg(long, global = true)]
    pub esserver: Option<String>,

    /// Results per page
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub page_size: Option<u16>,

    /// Do not report every request as a debug message
    #[arg(long, global = true)]
    pub no_debug: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Manage cases
    Cases {
        /// Case action
        #[command(subcommand)]
        action: CasesAction,
    },
    /// Manage sources
    Sources {
        /// Source action
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Search a source index
    Search {
        /// Index of the source
        index: String,
        /// Query text
        text: String,
        /// Query flavour
        #[arg(long = "type", default_value = "query_string")]
        query_type: QueryType,
        /// Position of the first result
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Field to sort by
        #[arg(long, default_value = "_score")]
        sort: String,
        /// Sort in descending order
        #[arg(long)]
        desc: bool,
        /// Case the search belongs to (recorded in the query log)
        #[arg(long)]
        case: Option<String>,
        /// Source the search belongs to (recorded in the query log)
        #[arg(long)]
        source: Option<String>,
    },
    /// Add a tag to every document matching a query
    TagAll {
        /// Index of the source
        index: String,
        /// Query text
        text: String,
        /// Query flavour
        #[arg(long = "type", default_value = "query_string")]
        query_type: QueryType,
        /// Tag to add
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Edit one result of a query
    Edit {
        /// Index of the source
        index: String,
        /// Query text
        text: String,
        /// Query flavour
        #[arg(long = "type", default_value = "query_string")]
        query_type: QueryType,
        /// Position of the first result of the page
        #[arg(long, default_value_t = 0)]
        offset: i64,
        /// Position of the result in the page
        #[arg(long)]
        result: usize,
        /// JSON object with the fields to change
        #[arg(long)]
        fields: String,
    },
    /// List a directory of a source
    Ls {
        /// Case name
        casename: String,
        /// Source name
        source: String,
        /// Directory, relative to the source root
        #[arg(default_value = "")]
        dirname: String,
    },
    /// Download a file of a source
    Download {
        /// Case name
        casename: String,
        /// Source name
        source: String,
        /// Directory of the file
        dirname: String,
        /// File name
        filename: String,
        /// Destination (defaults to the file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or set the analyst name
    Analyst {
        /// New name
        name: Option<String>,
    },
    /// Show or set the saved ElasticSearch server
    Server {
        /// New server URL
        url: Option<String>,
    },
}

/// Case actions.
#[derive(Subcommand, Debug, PartialEq)]
pub enum CasesAction {
    /// List cases
    List,
    /// Create a case from a JSON object with a `name`
    New {
        /// Case metadata
        metadata: String,
    },
    /// Change fields of a case
    Edit {
        /// Position in the list
        idx: usize,
        /// JSON object with the fields to change
        metadata: String,
    },
    /// Remove the metadata of a case
    Rm {
        /// Position in the list
        idx: usize,
    },
}

/// Source actions.
#[derive(Subcommand, Debug, PartialEq)]
pub enum SourcesAction {
    /// List the sources of a case
    List {
        /// Case name
        casename: String,
    },
    /// Show one source
    Show {
        /// Source name
        name: String,
    },
    /// Create a source from a JSON object with a `name` and a `casename`
    New {
        /// Source metadata
        metadata: String,
    },
    /// Change fields of a source
    Edit {
        /// Case name
        casename: String,
        /// Position in the list
        idx: usize,
        /// JSON object with the fields to change
        metadata: String,
    },
    /// Remove the metadata of a source
    Rm {
        /// Case name
        casename: String,
        /// Position in the list
        idx: usize,
    },
    /// Documents per blindsearch in a source index
    Stats {
        /// Index of the source
        index: String,
    },
}

const CASE_COLUMNS: &[&str] = &["name", "description"];
const SOURCE_COLUMNS: &[&str] = &["name", "casename", "started", "status"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = config::load_config_with_precedence(args.config.clone())?;
        let merged = config::merge_config(config_file);
        let with_env = config::apply_env_overrides(merged);
        let debug_override = if args.no_debug { Some(false) } else { None };
        config::apply_cli_overrides(
            with_env,
            args.esserver.clone(),
            args.page_size.map(usize::from),
            debug_override,
        )
    };
    config::validate(&config)?;

    rvt2_analyzer::logging::init(&config.log_file_path)?;
    info!(config = ?config, "Configuration loaded and resolved");

    let persisted = LocalStore::open(&config.state_file_path)?;
    let mut root = RootState::load(&config, persisted);
    let server = args
        .esserver
        .clone()
        .unwrap_or_else(|| root.esserver().to_string());

    let transport = HttpTransport::new(config.request_timeout)?;
    let mut dispatcher = Dispatcher::new(
        ElasticClient::new(transport, server, config.doctype.as_str()),
        MessageBus::new(config.message_capacity),
        config.es_debug,
    );

    let output = run(args.command, &config, &mut root, &mut dispatcher)?;
    if !output.is_empty() {
        println!("{output}");
    }

    let notifications = dispatcher.messages_mut().drain();
    if !notifications.is_empty() {
        eprintln!("{}", view::render_notifications(&notifications));
    }
    if notifications.iter().any(|n| n.kind == NotificationKind::Error) {
        std::process::exit(1);
    }
    Ok(())
}

fn run<T: Transport>(
    command: Command,
    config: &ResolvedConfig,
    root: &mut RootState,
    dispatcher: &mut Dispatcher<T>,
) -> Result<String, AppError> {
    match command {
        Command::Cases { action } => run_cases(action, config, dispatcher),
        Command::Sources { action } => run_sources(action, config, dispatcher),
        Command::Search {
            index,
            text,
            query_type,
            offset,
            sort,
            desc,
            case,
            source,
        } => {
            root.set_casename(case);
            root.set_source(source);
            let mut state = search_state(config, &index)?;
            state.set_sort(Sort::new(sort, desc));
            query_at_offset(&mut state, dispatcher, root, SearchQuery::new(query_type, text), offset);
            Ok(view::render_results(&state, &config.labels))
        }
        Command::TagAll {
            index,
            text,
            query_type,
            tags,
        } => {
            let mut state = search_state(config, &index)?;
            state.tag_all(dispatcher, &SearchQuery::new(query_type, text).with_tags(tags));
            Ok(String::new())
        }
        Command::Edit {
            index,
            text,
            query_type,
            offset,
            result,
            fields,
        } => {
            let partial = parse_fields(&fields)?;
            let mut state = search_state(config, &index)?;
            let query = SearchQuery::new(query_type, text);
            if query_at_offset(&mut state, dispatcher, root, query, offset) == Outcome::Completed
                && state.edit_result(dispatcher, result, partial) == Outcome::Completed
            {
                return Ok(view::render_results(&state, &config.labels));
            }
            Ok(String::new())
        }
        Command::Ls {
            casename,
            source,
            dirname,
        } => {
            let files = files_client(config, root, casename, source)?;
            let directory = files.get_directory(&dirname)?;
            Ok(view::render_directory(&directory))
        }
        Command::Download {
            casename,
            source,
            dirname,
            filename,
            output,
        } => {
            let files = files_client(config, root, casename, source)?;
            let dest = output.unwrap_or_else(|| PathBuf::from(&filename));
            let bytes = files.download_file(&dirname, &filename, &dest)?;
            Ok(format!("{bytes} bytes written to {}", dest.display()))
        }
        Command::Analyst { name } => {
            if let Some(name) = name {
                root.set_analyst(name)?;
            }
            Ok(root.analyst().unwrap_or("(no analyst)").to_string())
        }
        Command::Server { url } => {
            if let Some(url) = url {
                root.set_esserver(url)?;
                dispatcher.set_server(root.esserver());
            }
            Ok(root.esserver().to_string())
        }
    }
}

fn run_cases<T: Transport>(
    action: CasesAction,
    config: &ResolvedConfig,
    dispatcher: &mut Dispatcher<T>,
) -> Result<String, AppError> {
    let mut cases = CaseStore::new(
        IndexName::new(config.cases_index.as_str())?,
        config.max_number_cases,
        config.wait_reload_cases,
    );
    match action {
        CasesAction::List => {
            cases.load_cases(dispatcher);
        }
        CasesAction::New { metadata } => {
            cases.new_case(dispatcher, &parse_fields(&metadata)?);
        }
        CasesAction::Edit { idx, metadata } => {
            let partial = parse_fields(&metadata)?;
            if cases.load_cases(dispatcher).is_completed() {
                cases.edit_case(dispatcher, idx, partial);
            }
        }
        CasesAction::Rm { idx } => {
            if cases.load_cases(dispatcher).is_completed() {
                cases.remove_case(dispatcher, idx);
            }
        }
    }
    Ok(view::render_records(cases.cases(), CASE_COLUMNS))
}

fn run_sources<T: Transport>(
    action: SourcesAction,
    config: &ResolvedConfig,
    dispatcher: &mut Dispatcher<T>,
) -> Result<String, AppError> {
    let mut sources = SourceStore::new(
        IndexName::new(config.sources_index.as_str())?,
        config.max_number_sources,
        config.wait_reload_sources,
    );
    match action {
        SourcesAction::List { casename } => {
            sources.load_sources(dispatcher, &casename);
        }
        SourcesAction::Show { name } => {
            sources.load_source_by_name(dispatcher, &name);
        }
        SourcesAction::New { metadata } => {
            sources.new_source(dispatcher, &parse_fields(&metadata)?);
        }
        SourcesAction::Edit {
            casename,
            idx,
            metadata,
        } => {
            let partial = parse_fields(&metadata)?;
            if sources.load_sources(dispatcher, &casename).is_completed() {
                sources.edit_source(dispatcher, idx, partial);
            }
        }
        SourcesAction::Rm { casename, idx } => {
            if sources.load_sources(dispatcher, &casename).is_completed() {
                sources.remove_source(dispatcher, idx);
            }
        }
        SourcesAction::Stats { index } => {
            let stats = sources.get_stats(dispatcher, &IndexName::new(index)?);
            return Ok(view::render_stats(&stats));
        }
    }
    Ok(view::render_records(sources.sources(), SOURCE_COLUMNS))
}

/// Run `query` on a fresh state and show the page starting at `offset`.
///
/// A fresh state knows no total, so any later page is reached by loading the first one.
fn query_at_offset<T: Transport>(
    state: &mut SearchState,
    dispatcher: &mut Dispatcher<T>,
    root: &RootState,
    query: SearchQuery,
    offset: i64,
) -> Outcome {
    let outcome = if offset > 0 {
        let first = state.run_query(dispatcher, root, Some(query), 0);
        if !first.is_completed() {
            return first;
        }
        state.run_query(dispatcher, root, None, offset)
    } else {
        state.run_query(dispatcher, root, Some(query), offset)
    };
    if outcome == Outcome::Skipped {
        dispatcher.notify(
            NotificationKind::Warning,
            format!(
                "Offset {offset} is outside the results ({} total)",
                state.total_hits()
            ),
        );
    }
    outcome
}

fn search_state(config: &ResolvedConfig, index: &str) -> Result<SearchState, AppError> {
    let mut state = SearchState::new(SearchSettings {
        page_size: config.result_size,
        queries_index: IndexName::new(config.queries_index.as_str())?,
    });
    state.set_index(IndexName::new(index)?);
    Ok(state)
}

fn files_client(
    config: &ResolvedConfig,
    root: &RootState,
    casename: String,
    source: String,
) -> Result<FilesClient<HttpTransport>, AppError> {
    let transport = HttpTransport::new(config.request_timeout)?;
    Ok(FilesClient::new(transport, root.rvt2files(), casename, source))
}

fn parse_fields(text: &str) -> Result<SourceFields, AppError> {
    match serde_json::from_str(text) {
        Ok(serde_json::Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(AppError::InvalidArgument(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(err) => Err(AppError::InvalidArgument(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        let result = Args::try_parse_from(["rvt2-analyzer", "--help"]);
        let err = result.expect_err("help exits early");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["rvt2-analyzer", "--version"]);
        let err = result.expect_err("version exits early");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Args::try_parse_from(["rvt2-analyzer"]).is_err());
    }

    #[test]
    fn test_search_defaults() {
        let args = Args::parse_from(["rvt2-analyzer", "search", "case1-disk", "invoice"]);
        assert_eq!(args.config, None);
        assert_eq!(args.esserver, None);
        assert_eq!(args.page_size, None);
        assert!(!args.no_debug);
        assert_eq!(
            args.command,
            Command::Search {
                index: "case1-disk".to_string(),
                text: "invoice".to_string(),
                query_type: QueryType::QueryString,
                offset: 0,
                sort: "_score".to_string(),
                desc: false,
                case: None,
                source: None,
            }
        );
    }

    #[test]
    fn test_search_with_every_option() {
        let args = Args::parse_from([
            "rvt2-analyzer",
            "search",
            "case1-disk",
            "invoice",
            "--type",
            "match",
            "--offset",
            "50",
            "--sort",
            "date",
            "--desc",
            "--case",
            "case-1",
            "--page-size",
            "10",
        ]);
        let Command::Search {
            query_type,
            offset,
            sort,
            desc,
            case,
            ..
        } = args.command
        else {
            panic!("expected search");
        };
        assert_eq!(query_type, QueryType::Match);
        assert_eq!(offset, 50);
        assert_eq!(sort, "date");
        assert!(desc);
        assert_eq!(case, Some("case-1".to_string()));
        assert_eq!(args.page_size, Some(10));
    }

    #[test]
    fn test_negative_offset_is_accepted_by_the_parser() {
        let args = Args::parse_from(["rvt2-analyzer", "search", "i", "q", "--offset", "-50"]);
        assert!(matches!(args.command, Command::Search { offset: -50, .. }));
    }

    #[test]
    fn test_unknown_query_type_rejects() {
        let result = Args::try_parse_from(["rvt2-analyzer", "search", "i", "q", "--type", "fuzzy"]);
        let err = result.expect_err("unknown type");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_page_size_rejects_zero() {
        let result = Args::try_parse_from(["rvt2-analyzer", "--page-size", "0", "cases", "list"]);
        let err = result.expect_err("zero page size");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_tag_all_collects_tags() {
        let args = Args::parse_from([
            "rvt2-analyzer",
            "tag-all",
            "case1-disk",
            "invoice",
            "--tag",
            "important",
        ]);
        let Command::TagAll { tags, query_type, .. } = args.command else {
            panic!("expected tag-all");
        };
        assert_eq!(tags, vec!["important".to_string()]);
        assert_eq!(query_type, QueryType::QueryString);
    }

    #[test]
    fn test_cases_subcommands() {
        let args = Args::parse_from(["rvt2-analyzer", "cases", "rm", "2"]);
        assert_eq!(
            args.command,
            Command::Cases {
                action: CasesAction::Rm { idx: 2 }
            }
        );
    }

    #[test]
    fn test_sources_stats() {
        let args = Args::parse_from(["rvt2-analyzer", "--no-debug", "sources", "stats", "c1-disk"]);
        assert!(args.no_debug);
        assert_eq!(
            args.command,
            Command::Sources {
                action: SourcesAction::Stats {
                    index: "c1-disk".to_string()
                }
            }
        );
    }

    #[test]
    fn test_ls_defaults_to_source_root() {
        let args = Args::parse_from(["rvt2-analyzer", "ls", "case-1", "disk-a"]);
        assert!(matches!(args.command, Command::Ls { ref dirname, .. } if dirname.is_empty()));
    }

    #[test]
    fn test_config_path() {
        let args = Args::parse_from([
            "rvt2-analyzer",
            "--config",
            "/custom/config.toml",
            "analyst",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(args.command, Command::Analyst { name: None });
    }

    #[test]
    fn test_parse_fields_requires_an_object() {
        assert!(parse_fields(r#"{"tags": ["seen"]}"#).is_ok());
        assert!(matches!(
            parse_fields("[1, 2]"),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_fields("{not json"),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_page_size_flows_through_config_precedence_chain() {
        use rvt2_analyzer::config::{apply_cli_overrides, apply_env_overrides, merge_config, ConfigFile};

        let config_file = ConfigFile {
            result_size: Some(25),
            ..ConfigFile::default()
        };

        let merged = merge_config(Some(config_file));
        assert_eq!(merged.result_size, 25, "Config file should override default page size");

        let with_env = apply_env_overrides(merged);
        assert_eq!(with_env.result_size, 25);

        let with_cli = apply_cli_overrides(with_env, None, Some(10), None);
        assert_eq!(with_cli.result_size, 10, "CLI page size should override all other sources");
    }

    /// Search backend holding `total` documents, one per position.
    struct PagedIndex {
        total: u64,
        requests: std::cell::RefCell<Vec<rvt2_analyzer::client::HttpRequest>>,
    }

    impl PagedIndex {
        fn new(total: u64) -> Self {
            Self {
                total,
                requests: std::cell::RefCell::new(Vec::new()),
            }
        }

        fn searches(&self) -> Vec<serde_json::Value> {
            self.requests
                .borrow()
                .iter()
                .filter(|r| r.url.ends_with("/_search"))
                .filter_map(|r| r.body.clone())
                .collect()
        }
    }

    impl Transport for PagedIndex {
        fn send(
            &self,
            request: &rvt2_analyzer::client::HttpRequest,
        ) -> Result<rvt2_analyzer::client::HttpResponse, rvt2_analyzer::model::ClientError> {
            use rvt2_analyzer::client::HttpResponse;
            use serde_json::json;

            self.requests.borrow_mut().push(request.clone());
            if !request.url.ends_with("/_search") {
                return Ok(HttpResponse::json(200, &json!({"result": "updated"})));
            }
            let body = request.body.clone().unwrap_or_default();
            let from = body["from"].as_u64().unwrap_or(0);
            let size = body["size"].as_u64().unwrap_or(0);
            let hits: Vec<serde_json::Value> = (from..(from + size).min(self.total))
                .map(|n| json!({"_id": format!("doc-{n}"), "_score": 1.0, "_source": {"path": format!("/f/{n}")}}))
                .collect();
            Ok(HttpResponse::json(
                200,
                &json!({"hits": {"total": {"value": self.total, "relation": "eq"}, "hits": hits}}),
            ))
        }
    }

    fn run_against(backend: &PagedIndex, argv: &[&str]) -> (Result<String, AppError>, MessageBus) {
        let config = ResolvedConfig::default();
        let mut root = RootState::load(&config, LocalStore::in_memory());
        let mut dispatcher = Dispatcher::new(
            ElasticClient::new(backend, "http://es.test:9200", "_doc"),
            MessageBus::new(100),
            false,
        );
        let args = Args::parse_from(argv);
        let output = run(args.command, &config, &mut root, &mut dispatcher);
        (output, dispatcher.messages().clone())
    }

    #[test]
    fn test_search_offset_reaches_a_later_page() {
        let backend = PagedIndex::new(500);
        let (output, messages) = run_against(
            &backend,
            &["rvt2-analyzer", "search", "idx", "invoice", "--offset", "50"],
        );

        let output = output.expect("search runs");
        assert!(output.starts_with("Results 51-100 of 500"), "{output}");
        assert!(output.contains("doc-50"));
        let froms: Vec<u64> = backend
            .searches()
            .iter()
            .filter_map(|b| b["from"].as_u64())
            .collect();
        assert_eq!(froms, vec![0, 50]);
        assert!(!messages.has_any());
    }

    #[test]
    fn test_search_offset_past_the_end_warns() {
        let backend = PagedIndex::new(30);
        let (output, messages) = run_against(
            &backend,
            &["rvt2-analyzer", "search", "idx", "invoice", "--offset", "50"],
        );

        assert!(output.expect("search runs").starts_with("Results 1-30 of 30"));
        assert_eq!(backend.searches().len(), 1);
        assert_eq!(
            messages.peek_last(NotificationKind::Warning),
            Some("Offset 50 is outside the results (30 total)")
        );
    }

    #[test]
    fn test_edit_offset_targets_the_requested_page() {
        let backend = PagedIndex::new(500);
        let (output, messages) = run_against(
            &backend,
            &[
                "rvt2-analyzer",
                "edit",
                "idx",
                "invoice",
                "--offset",
                "50",
                "--result",
                "1",
                "--fields",
                r#"{"tags": ["check"]}"#,
            ],
        );

        assert!(output.expect("edit runs").starts_with("Results 51-100 of 500"));
        let update = backend
            .requests
            .borrow()
            .iter()
            .find(|r| r.url.ends_with("/_update"))
            .cloned()
            .expect("update sent");
        assert_eq!(update.url, "http://es.test:9200/idx/_doc/doc-51/_update");
        assert!(!messages.has_any());
    }
}
