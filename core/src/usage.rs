//! Usage and help text, rendered from the grammar tree.
//!
//! The summary line lists positionals first, then flags, each in
//! registration order. Optional units are wrapped in `[ ]` and exclusive
//! alternatives are joined with `|`. The help body indents one level (four
//! spaces) per nesting depth.

use crate::node::{Entry, FlagId, StoreId};
use crate::parser::ROOT;
use crate::Parser;

const INDENT: &str = "    ";

impl Parser {
    /// `Usage: <program> <tree summary>`.
    pub fn usage_summary(&self) -> String {
        let mut out = format!("Usage: {}", self.program_name());
        self.write_summary(ROOT, &mut out);
        out
    }

    /// Help body: one block per described node, nested blocks indented.
    pub fn usage_help(&self) -> String {
        let mut out = String::new();
        self.write_help(ROOT, 0, &mut out);
        out
    }

    /// Summary line, `Arguments:` header and help body.
    pub fn usage(&self) -> String {
        format!("{}\n\nArguments:{}\n", self.usage_summary(), self.usage_help())
    }

    fn write_summary(&self, store: StoreId, out: &mut String) {
        for id in &self.stores[store.0].args {
            let arg = &self.positionals[id.0];
            out.push(' ');
            out.push_str(&arg.state.policy.bracket(&arg.name));
        }

        for entry in self.ordered_entries(store) {
            let (policy, unit) = match entry {
                Entry::Flag(id) => (self.flags[id.0].state.policy, self.flag_summary(id)),
                Entry::Group(id) => {
                    let group = &self.groups[id.0];
                    if group.members.is_empty() {
                        continue;
                    }
                    let alternatives: Vec<String> = group
                        .members
                        .iter()
                        .map(|member| self.flag_summary(*member))
                        .collect();
                    (group.state.policy, alternatives.join("|"))
                }
            };
            out.push(' ');
            out.push_str(&policy.bracket(&unit));
        }
    }

    /// Key followed by the summary of its nested store.
    fn flag_summary(&self, id: FlagId) -> String {
        let flag = &self.flags[id.0];
        let mut out = flag.key.clone();
        if let Some(children) = flag.children {
            self.write_summary(children, &mut out);
        }
        out
    }

    fn write_help(&self, store: StoreId, level: usize, out: &mut String) {
        let level = level + 1;
        for id in &self.stores[store.0].args {
            let arg = &self.positionals[id.0];
            if arg.state.description.is_empty() {
                continue;
            }
            new_line(out, level);
            out.push_str(&arg.name);
            if arg.state.policy.is_optional() {
                out.push_str(" [optional]");
            }
            out.push_str(": ");
            out.push_str(&arg.state.description);
        }

        for entry in self.ordered_entries(store) {
            match entry {
                Entry::Flag(id) => self.write_flag_help(id, level, out),
                Entry::Group(id) => {
                    for member in &self.groups[id.0].members {
                        self.write_flag_help(*member, level, out);
                    }
                }
            }
        }
    }

    fn write_flag_help(&self, id: FlagId, level: usize, out: &mut String) {
        let flag = &self.flags[id.0];
        if flag.state.description.is_empty() {
            return;
        }
        new_line(out, level);
        out.push_str(&self.flag_summary(id));
        new_line(out, level);
        if flag.state.policy.is_optional() {
            out.push_str("[optional] ");
        }
        out.push_str(&flag.state.description);
        if let Some(children) = flag.children {
            self.write_help(children, level, out);
        }
    }
}

fn new_line(out: &mut String, level: usize) {
    out.push('\n');
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use crate::{convert, ErrorMode, Parser, Policy};

    fn speed_parser() -> Parser {
        let mut p = Parser::new()
            .with_program_name("tool")
            .with_error_mode(ErrorMode::Return);
        let root = p.root();
        let power = p
            .add_complex_flag(root, "-p", Policy::Optional, "Specify power output.")
            .unwrap();
        p.add_arg(
            power.store(),
            "number_watts",
            Policy::Mandatory,
            "An integer representing the number of watts.",
            convert::integer::<i32>(),
        )
        .unwrap();
        let speed = p
            .add_complex_flag(root, "--speed", Policy::Mandatory, "Specify the speed.")
            .unwrap();
        let group = p
            .add_exclusive_group(speed.store(), Policy::Mandatory)
            .unwrap();
        for key in ["slow", "medium", "fast"] {
            p.add_group_flag(group, key, "").unwrap();
        }
        p
    }

    #[test]
    fn test_summary() {
        let p = speed_parser();
        assert_eq!(
            p.usage_summary(),
            "Usage: tool [-p number_watts] --speed slow|medium|fast"
        );
    }

    #[test]
    fn test_full_usage() {
        let p = speed_parser();
        let expected = "\
Usage: tool [-p number_watts] --speed slow|medium|fast

Arguments:
    -p number_watts
    [optional] Specify power output.
        number_watts: An integer representing the number of watts.
    --speed slow|medium|fast
    Specify the speed.
";
        assert_eq!(p.usage(), expected);
    }

    #[test]
    fn test_optional_group_and_args() {
        let mut p = Parser::new().with_program_name("fmt");
        let root = p.root();
        p.add_arg(root, "input", Policy::Mandatory, "", convert::text())
            .unwrap();
        p.add_arg(root, "output", Policy::Optional, "Where to write.", convert::text())
            .unwrap();
        let group = p.add_exclusive_group(root, Policy::Optional).unwrap();
        p.add_group_flag(group, "--json", "Emit JSON.").unwrap();
        p.add_group_flag(group, "--yaml", "").unwrap();

        assert_eq!(p.usage_summary(), "Usage: fmt input [output] [--json|--yaml]");
        assert_eq!(
            p.usage_help(),
            "\n    output [optional]: Where to write.\n    --json\n    [optional] Emit JSON."
        );
    }

    #[test]
    fn test_help_flag_listed_last() {
        let mut p = Parser::new().with_program_name("x");
        let root = p.root();
        p.enable_help().unwrap();
        p.add_flag(root, "-q", Policy::Optional, "Quiet.").unwrap();

        assert_eq!(p.usage_summary(), "Usage: x [-q] [--help]");
        assert!(p.usage_help().ends_with("--help\n    [optional] Print this help message."));
    }

    #[test]
    fn test_empty_group_is_skipped() {
        let mut p = Parser::new().with_program_name("x");
        let root = p.root();
        p.add_exclusive_group(root, Policy::Mandatory).unwrap();
        assert_eq!(p.usage_summary(), "Usage: x");
    }
}
