//! Plain-text help for the `help` sub-actions.

use cmdtree::{ActionRef, Context, HandlerResult, OptionType};

/// Handler for `help [topic...]`.
///
/// Describes the action the `help` node hangs under, or the sub-action
/// named by the arguments.
pub fn show(ctx: &Context) -> HandlerResult {
    let owner = ctx.action().parent().unwrap_or_else(|| ctx.action());
    let mut target = owner;
    for topic in ctx.arguments() {
        match target.child(topic) {
            Some(child) => target = child,
            None => anyhow::bail!("no help topic '{}' under '{}'", topic, target.path()),
        }
    }
    ctx.write(render(target))?;
    Ok(())
}

pub fn render(action: ActionRef<'_>) -> String {
    let mut out = String::new();

    let mut usage = format!("usage: {}", action.path());
    if action.has_children() {
        usage.push_str(" <command>");
    }
    if !action.options().is_empty() {
        usage.push_str(" [options]");
    }
    if action.arguments_enabled() {
        usage.push_str(" [args...]");
    }
    out.push_str(&usage);
    out.push('\n');

    if let Some(description) = action.description() {
        out.push_str(&format!("\n{}\n", description));
    }

    let commands: Vec<_> = action
        .children()
        .filter(|child| child.name() != "help" && child.name() != "version")
        .collect();
    if !commands.is_empty() {
        out.push_str("\ncommands:\n");
        let width = commands.iter().map(|c| c.name().len()).max().unwrap_or(0);
        for child in commands {
            let line = format!(
                "  {:width$}  {}",
                child.name(),
                child.description().unwrap_or(""),
                width = width
            );
            push_line(&mut out, &line);
        }
    }

    if !action.options().is_empty() {
        out.push_str("\noptions:\n");
        let rows: Vec<(String, &str)> = action
            .options()
            .iter()
            .map(|spec| {
                let short = spec
                    .short_name()
                    .map(|c| format!("-{}, ", c))
                    .unwrap_or_else(|| "    ".to_string());
                let value = match spec.kind() {
                    OptionType::Boolean => String::new(),
                    kind => format!(" <{}>", kind),
                };
                (
                    format!("{}--{}{}", short, spec.name(), value),
                    spec.description().unwrap_or(""),
                )
            })
            .collect();
        let width = rows.iter().map(|(flag, _)| flag.len()).max().unwrap_or(0);
        for (flag, description) in rows {
            let line = format!("  {:width$}  {}", flag, description, width = width);
            push_line(&mut out, &line);
        }
    }

    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}
