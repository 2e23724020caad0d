use anyhow::{Context, anyhow};
use clap::Parser;
use doxysearch_mcp::cli::{Cli, Commands};
use doxysearch_mcp::config::Config;
use doxysearch_mcp::server::DocsetServer;
use doxysearch_mcp::state::DocsetState;
use doxysearch_mcp::tools::{
    FindRequest, SearchRequest, ValidateRequest, dump_table, format_roundtrip, handle_find,
    handle_search, handle_sections, rebuild, roundtrip, validate,
};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    doxysearch_mcp::tracing::init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).await?;
    if let Some(docs) = cli.docs {
        config.docs_root = Some(docs);
    }
    let state = Arc::new(DocsetState::new(config));

    match cli.command {
        Commands::Serve => serve(state).await,
        Commands::Search {
            query,
            section,
            limit,
        } => {
            open_docset(&state).await?;
            let request = SearchRequest {
                query,
                section: Some(section),
                limit,
            };
            print_tool(handle_search(&state, request).await)
        }
        Commands::Find { query, limit } => {
            open_docset(&state).await?;
            print_tool(handle_find(&state, FindRequest { query, limit }).await)
        }
        Commands::Validate { file, strict } => {
            open_docset(&state).await?;
            let request = ValidateRequest {
                file,
                strict: strict.then_some(true),
            };
            let outcome = validate(&state, request).await.map_err(|e| anyhow!(e))?;
            print!("{}", outcome.text);
            if outcome.ok {
                Ok(())
            } else {
                Err(anyhow!("validation found errors"))
            }
        }
        Commands::Sections => {
            open_docset(&state).await?;
            print_tool(handle_sections(&state).await)
        }
        Commands::Roundtrip { path } => {
            let results = roundtrip(&path).await?;
            print!("{}", format_roundtrip(&results));
            let changed = results.iter().filter(|r| !r.is_identical()).count();
            if changed == 0 {
                Ok(())
            } else {
                Err(anyhow!("{} of {} tables changed on rewrite", changed, results.len()))
            }
        }
        Commands::Dump { path, pretty } => {
            println!("{}", dump_table(&path, pretty).await?);
            Ok(())
        }
        Commands::Rebuild { symbols, output } => {
            print!("{}", rebuild(&symbols, &output).await?);
            Ok(())
        }
    }
}

async fn serve(state: Arc<DocsetState>) -> anyhow::Result<()> {
    tracing::info!("Starting doxysearch MCP server");
    state.open_configured().await;

    let service = DocsetServer::new(state)
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("Error serving MCP server: {:?}", e))?;
    service.waiting().await?;
    Ok(())
}

async fn open_docset(state: &DocsetState) -> anyhow::Result<()> {
    let root = state
        .config()
        .docs_root
        .clone()
        .context("No documentation tree given. Pass --docs <path> or set docs_root in doxysearch.toml")?;
    state.open(&root).await?;
    Ok(())
}

fn print_tool(result: Result<String, String>) -> anyhow::Result<()> {
    let text = result.map_err(|e| anyhow!(e))?;
    print!("{}", text);
    Ok(())
}
