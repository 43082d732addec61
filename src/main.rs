//! treeql - compile filter strings, orderings and tree walks to SQL

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use std::path::PathBuf;
use treeql::authorization::{compile_authorization, DEFAULT_NAVIGATION};
use treeql::catalog::ViewModel;
use treeql::config::CompilerConfig;
use treeql::filter::{compile_where, PredicateBuilder};
use treeql::hierarchy::{HierarchicalQueryCompiler, Traversal, TreeQuery};
use treeql::sort::{apply_sort, parse_order_by};
use treeql::sql::{CompiledQuery, EntityQuery, QueryCompiler, RelationalCompiler};

/// treeql - A dynamic predicate and recursive query compiler
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file describing the dialect, entity types and views
    #[arg(short, long, default_value = "treeql.json")]
    config: PathBuf,

    /// Write literals into the SQL instead of binding them
    #[arg(short, long)]
    inline: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile `column operator value` filter tokens against a view
    Where {
        #[arg(short, long)]
        view: String,
        /// Filter tokens, e.g. "age gt 30"
        tokens: Vec<String>,
    },
    /// Compile an order-by string against a view
    Order {
        #[arg(short, long)]
        view: String,
        /// Order string, e.g. "name desc, age"
        order: String,
    },
    /// Compile a recursive tree walk
    Tree {
        #[arg(short, long)]
        view: String,
        /// Filter tokens selecting the start rows
        #[arg(short, long, required = true)]
        start: Vec<String>,
        /// Filter tokens restricting the rows reached
        #[arg(short, long)]
        filter: Vec<String>,
        /// Walk towards the roots instead of the leaves
        #[arg(short, long)]
        ancestors: bool,
        /// Property ordering siblings
        #[arg(short, long)]
        order_by: Option<String>,
        /// Only return rows at this depth
        #[arg(short, long, default_value = "0")]
        level: i32,
        #[arg(long)]
        distinct: bool,
    },
    /// Compile a permission-assignment test
    Authorize {
        #[arg(short, long)]
        entity: String,
        /// Comma separated role ids
        #[arg(short, long, value_delimiter = ',', required = true)]
        roles: Vec<i32>,
        #[arg(short, long)]
        operation: i32,
        /// Test refusals instead of grants
        #[arg(long)]
        deny: bool,
        /// Test the operation as a bitmask
        #[arg(long)]
        bitmask: bool,
        #[arg(short, long, default_value = DEFAULT_NAVIGATION)]
        navigation: String,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = CompilerConfig::from_path(&args.config)?;
    let registry = config.to_registry();
    let queries = RelationalCompiler::new(&registry, config.dialect.clone());

    let compile = |query: &EntityQuery| -> Result<CompiledQuery> {
        let compiled = if args.inline {
            CompiledQuery {
                sql: queries.compile_to_sql(query)?,
                parameters: Vec::new(),
            }
        } else {
            queries.compile_to_sql_with_params(query)?
        };
        Ok(compiled)
    };

    match &args.command {
        Command::Where { view, tokens } => {
            let view = find_view(&config, view)?;
            let predicates = compile_where(&registry, view, tokens.as_slice())?;
            let mut query = EntityQuery::new(view.entity.clone());
            for predicate in predicates {
                println!("predicate: {}", predicate);
                query = query.filter(predicate);
            }
            print_query(&compile(&query)?);
        }
        Command::Order { view, order } => {
            let view = find_view(&config, view)?;
            let order_bys = parse_order_by(order);
            for order_by in &order_bys {
                println!("order: {} {}", order_by.key, order_by.direction);
            }
            let query = apply_sort(EntityQuery::new(view.entity.clone()), view, &order_bys)?;
            print_query(&compile(&query)?);
        }
        Command::Tree {
            view,
            start,
            filter,
            ancestors,
            order_by,
            level,
            distinct,
        } => {
            let view = find_view(&config, view)?;
            let start = PredicateBuilder::all(compile_where(&registry, view, start.as_slice())?)
                .context("No start token resolved to a view column")?;

            let mut query = TreeQuery::for_entity(view.entity.clone(), start)
                .traversal(if *ancestors {
                    Traversal::Ancestors
                } else {
                    Traversal::Descendants
                })
                .level(*level);
            let conditions = compile_where(&registry, view, filter.as_slice())?;
            query.filter = PredicateBuilder::all(conditions);
            query.order_property = order_by.clone();
            if *distinct {
                query = query.distinct();
            }

            let compiler = HierarchicalQueryCompiler::new(&registry, &queries);
            let compiled = if args.inline {
                CompiledQuery {
                    sql: compiler.compile_to_sql(&query)?,
                    parameters: Vec::new(),
                }
            } else {
                compiler.compile(&query)?
            };
            print_query(&compiled);
        }
        Command::Authorize {
            entity,
            roles,
            operation,
            deny,
            bitmask,
            navigation,
        } => {
            let predicate = compile_authorization(
                &registry, entity, roles, *operation, *deny, *bitmask, navigation,
            )?;
            println!("predicate: {}", predicate);
            print_query(&compile(&EntityQuery::new(entity.clone()).filter(predicate))?);
        }
    }

    Ok(())
}

fn find_view<'a>(config: &'a CompilerConfig, name: &str) -> Result<&'a ViewModel> {
    match config.view(name) {
        Some(view) => Ok(view),
        None => bail!("Unknown view: {}", name),
    }
}

fn print_query(compiled: &CompiledQuery) {
    println!("{}", compiled.sql);
    for (i, parameter) in compiled.parameters.iter().enumerate() {
        println!("  ${} = {}", i + 1, parameter.to_sql_literal());
    }
}
