//! Rule → configuration text
//!
//! Builds the canonical one-line configuration form of a [`Rule`] as a
//! sequence of tokens joined by single spaces. Defaults are elided the way the
//! configuration language implies them:
//!
//! - direction `inout` is never written
//! - `flags S/SA` is implied for stateful rules, `flags any` for stateless ones
//! - `proto any` and `inet`/`inet6` absence mean "any"
//!
//! Rendering is pure: the same rule and table always give the same text.

use crate::core::error::Result;
use crate::core::firewall::{Action, AddressFamily, Direction, Rule, State};
use crate::core::protocol::ProtocolTable;

/// Renders `rule` as a single configuration line (no trailing newline).
///
/// # Errors
///
/// Returns [`crate::core::error::Error::InvalidPortOperator`] when a port
/// clause carries bounds but no operator. No partial text is produced.
pub fn render_rule(rule: &Rule, protocols: &ProtocolTable) -> Result<String> {
    let mut dump: Vec<String> = Vec::with_capacity(16);

    write_action(&mut dump, rule);

    if rule.direction() != Direction::InOut {
        dump.push(rule.direction().to_string());
    }

    write_log(&mut dump, rule);

    if rule.quick() {
        dump.push("quick".to_string());
    }

    if rule.address_family() != AddressFamily::Any {
        dump.push(rule.address_family().to_string());
    }

    let proto = rule.protocol();
    if !proto.is_any() {
        dump.push("proto".to_string());
        dump.push(protocols.lookup(proto).into_owned());
    }

    dump.push("from".to_string());
    rule.source().write_tokens(&mut dump)?;

    dump.push("to".to_string());
    rule.destination().write_tokens(&mut dump)?;

    write_state(&mut dump, rule);

    Ok(dump.join(" "))
}

/// Renders each rule on its own line, joined by `\n` with no trailing newline.
///
/// Stops at the first rule that fails to render.
pub fn render_ruleset(rules: &[Rule], protocols: &ProtocolTable) -> Result<String> {
    let mut lines = Vec::with_capacity(rules.len());
    for (nr, rule) in rules.iter().enumerate() {
        match render_rule(rule, protocols) {
            Ok(line) => lines.push(line),
            Err(e) => {
                tracing::warn!("Rule @{} cannot be rendered: {}", nr, e);
                return Err(e);
            }
        }
    }
    tracing::debug!("Rendered {} rules", lines.len());
    Ok(lines.join("\n"))
}

fn write_action(dump: &mut Vec<String>, rule: &Rule) {
    let action = rule.action();
    if action == Action::Drop {
        dump.push("block".to_string());
        if rule.return_traffic() {
            dump.push("return".to_string());
        } else {
            // Only Drop reaches this branch, so this is always "drop".
            dump.push(action.as_str().to_string());
        }
    } else {
        dump.push(action.as_str().to_string());
    }
}

fn write_log(dump: &mut Vec<String>, rule: &Rule) {
    if !(rule.log() || rule.log_all() || rule.log_user()) {
        return;
    }
    dump.push("log".to_string());

    let mut opts: Vec<String> = Vec::with_capacity(3);
    if rule.log_all() {
        opts.push("all".to_string());
    }
    if rule.log_user() {
        opts.push("user".to_string());
    }
    if rule.log_interface() != 0 {
        opts.push(format!("to pflog{}", rule.log_interface()));
    }
    if !opts.is_empty() {
        dump.push(format!("({})", opts.join(", ")));
    }
}

/// Flag filter and state keyword, with the default of each mode elided.
fn write_state(dump: &mut Vec<String>, rule: &Rule) {
    let flags = rule.flags();
    let flags_apply = rule.protocol().carries_tcp_flags() && rule.action() == Action::Pass;

    if rule.state() != State::No {
        if flags_apply && !flags.is_default() {
            dump.push(flags.to_string());
        }
        dump.push(rule.state().to_string());
    } else if flags_apply && !flags.any() {
        dump.push(flags.to_string());
    }
}
