//! The todo command tree.
//!
//! ```text
//! todo
//! ├── add <title...> [-p N] [-t TAG]... [--then-list]
//! ├── list [--all] [--json]
//! ├── done <id>
//! ├── shell
//! ├── help [topic...]
//! └── version
//! ```
//!
//! The root has no handler of its own, so `todo` alone shows help. Every
//! change to the list fires the root's `changed` event.

use cmdtree::{
    Action, Command, CommandTree, Context, DefinitionError, EventContext, ExecuteOptions,
    HandlerResult, OptionSpec, Shell,
};
use serde_json::{json, Value};
use std::io;
use std::rc::Rc;
use tracing::info;

use crate::help;
use crate::store::{Store, Todo};

pub const NAME: &str = "todo";

pub fn build(store: Rc<Store>) -> Result<CommandTree, DefinitionError> {
    let listing = store.clone();
    let finishing = store.clone();
    let watching = store.clone();

    Action::new(NAME)
        .about("A tiny todo list")
        .help(help::show)
        .version(|ctx| {
            ctx.writeln(format!("{} {}", NAME, env!("CARGO_PKG_VERSION")))?;
            Ok(())
        })
        .event("changed", move |ev, args| changed(&watching, ev, args))
        .action(
            Action::new("add")
                .about("Add a todo")
                .arguments(true)
                .option(
                    OptionSpec::numeric("priority")
                        .short('p')
                        .with_default(1)
                        .with_description("Higher runs first"),
                )
                .option(
                    OptionSpec::any("tag")
                        .short('t')
                        .multiple()
                        .with_description("Tag, may repeat"),
                )
                .option(
                    OptionSpec::boolean("then-list").with_description("Show the list afterwards"),
                )
                .command(AddCommand { store }),
        )
        .action(
            Action::new("list")
                .about("Show todos")
                .option(
                    OptionSpec::boolean("all")
                        .short('a')
                        .with_description("Include finished todos"),
                )
                .option(OptionSpec::boolean("json").with_description("Print as JSON"))
                .handler(move |ctx| list(&listing, ctx)),
        )
        .action(
            Action::new("done")
                .about("Finish a todo")
                .arguments(true)
                .handler(move |ctx| done(&finishing, ctx)),
        )
        .action(
            Action::new("shell")
                .about("Read commands from standard input")
                .handler(|ctx| {
                    let summary = Shell::new(io::stdin().lock()).run(ctx)?;
                    info!(?summary, "shell closed");
                    Ok(())
                }),
        )
        .build()
}

struct AddCommand {
    store: Rc<Store>,
}

impl Command for AddCommand {
    fn execute(&self, ctx: &Context) -> HandlerResult {
        let title = ctx.arguments().join(" ");
        if title.is_empty() {
            anyhow::bail!("a todo needs a title");
        }
        let tags = ctx
            .values("tag")
            .iter()
            .filter_map(|tag| tag.as_str().map(str::to_string))
            .collect();
        let priority = ctx.int("priority").unwrap_or(1);

        let todo = self.store.add(title, priority, tags);
        ctx.writeln(format!("added #{}: {}", todo.id, todo.title))?;
        ctx.invoke("changed", &[json!("add"), serde_json::to_value(&todo)?])?;

        if ctx.flag("then-list") {
            ctx.forward("list", ExecuteOptions::new())?;
        }
        Ok(())
    }
}

fn list(store: &Store, ctx: &Context) -> HandlerResult {
    let todos = store.list(ctx.flag("all"));
    if ctx.flag("json") {
        ctx.writeln(serde_json::to_string_pretty(&todos)?)?;
        return Ok(());
    }
    if todos.is_empty() {
        ctx.writeln("nothing to do")?;
        return Ok(());
    }
    for todo in &todos {
        ctx.writeln(line(todo))?;
    }
    Ok(())
}

fn line(todo: &Todo) -> String {
    let mark = if todo.done { "x" } else { " " };
    let mut line = format!("[{}] #{} (p{}) {}", mark, todo.id, todo.priority, todo.title);
    if !todo.tags.is_empty() {
        line.push_str(&format!(" +{}", todo.tags.join(" +")));
    }
    line
}

fn done(store: &Store, ctx: &Context) -> HandlerResult {
    let [id] = ctx.arguments() else {
        anyhow::bail!("usage: {} done <id>", NAME);
    };
    let id: usize = id.parse()?;
    let todo = store.complete(id)?;
    ctx.writeln(format!("done #{}: {}", todo.id, todo.title))?;
    ctx.invoke("changed", &[json!("done"), serde_json::to_value(&todo)?])?;
    Ok(())
}

fn changed(store: &Store, ev: &EventContext<'_>, args: &[Value]) -> HandlerResult {
    let kind = args.first().and_then(Value::as_str).unwrap_or("update");
    info!(kind, from = ev.event().command(), "todo list changed");
    ev.writeln(format!("{} open", store.open_count()))?;
    Ok(())
}
