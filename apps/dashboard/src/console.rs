//! Line-oriented commands standing in for clicks and form inputs.

use anyhow::{anyhow, bail, Context, Result};
use dashboard_core::DashboardEvent;

pub const HELP: &str = "\
commands:
  select <id>             choose the planner restaurant (no id clears it)
  stop <x> <y>            add a planner stop
  start <x> <y>           set the manual start fields
  end <x> <y>             set the manual end fields
  route [heuristic] [strategy]
  point [heuristic]       point-to-point route from start to end
  reset                   clear stops and route
  live <id>               choose the restaurant for new orders
  order <x> <y>           create and assign an order
  snapshot                save both surfaces as PNG
  status                  print panels and errors
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Event(DashboardEvent),
    Snapshot,
    Status,
    Help,
    Quit,
}

/// Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match name.to_ascii_lowercase().as_str() {
        "select" => Command::Event(DashboardEvent::SelectRestaurant(
            optional(&args, 0).unwrap_or_default(),
        )),
        "stop" => {
            let (x, y) = integer_pair(name, &args)?;
            Command::Event(DashboardEvent::PlannerClick { x, y })
        }
        "start" => {
            let (x, y) = raw_pair(name, &args)?;
            Command::Event(DashboardEvent::SetManualStart { x, y })
        }
        "end" => {
            let (x, y) = raw_pair(name, &args)?;
            Command::Event(DashboardEvent::SetManualEnd { x, y })
        }
        "route" => Command::Event(DashboardEvent::ComputeRoute {
            heuristic: optional(&args, 0),
            strategy: optional(&args, 1),
        }),
        "point" => Command::Event(DashboardEvent::ComputePointRoute {
            heuristic: optional(&args, 0),
        }),
        "reset" => Command::Event(DashboardEvent::ResetPlanner),
        "live" => Command::Event(DashboardEvent::SelectLiveRestaurant(
            optional(&args, 0).unwrap_or_default(),
        )),
        "order" => {
            let (x, y) = integer_pair(name, &args)?;
            Command::Event(DashboardEvent::LiveClick { x, y })
        }
        "redraw" => Command::Event(DashboardEvent::Redraw),
        "snapshot" => Command::Snapshot,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(command))
}

fn optional(args: &[&str], index: usize) -> Option<String> {
    args.get(index).map(|arg| arg.to_string())
}

fn raw_pair(name: &str, args: &[&str]) -> Result<(String, String)> {
    match args {
        [x, y] => Ok((x.to_string(), y.to_string())),
        _ => Err(anyhow!("usage: {name} <x> <y>")),
    }
}

fn integer_pair(name: &str, args: &[&str]) -> Result<(i64, i64)> {
    let (x, y) = raw_pair(name, args)?;
    let x = x
        .parse::<i64>()
        .with_context(|| format!("{name}: x must be an integer"))?;
    let y = y
        .parse::<i64>()
        .with_context(|| format!("{name}: y must be an integer"))?;
    Ok((x, y))
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
