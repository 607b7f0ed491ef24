//! Scripted stand-in for the buck executable.

use buck_sources::{Invocation, Result, ToolOutput, ToolRunner};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Runs after every successful fake `buck build` with the built targets,
/// typically to drop link-trees into a [`crate::BuckOutFixture`].
pub type BuildEffect = Box<dyn Fn(&[String])>;

/// Answers `targets` and `build` invocations from queued outputs and records
/// every invocation it sees.
///
/// Each queue hands out its outputs in order and keeps repeating the last one.
/// An empty queue answers with an empty success.
#[derive(Default)]
pub struct FakeBuck {
    query_outputs: RefCell<VecDeque<ToolOutput>>,
    build_outputs: RefCell<VecDeque<ToolOutput>>,
    build_effect: Option<BuildEffect>,
    invocations: RefCell<Vec<Invocation>>,
}

impl FakeBuck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_query(self, output: ToolOutput) -> Self {
        self.query_outputs.borrow_mut().push_back(output);
        self
    }

    /// Query answer listing `lines`, one per line.
    pub fn on_query_lines(self, lines: &[&str]) -> Self {
        self.on_query(ToolOutput::success(lines.join("\n")))
    }

    pub fn on_build(self, output: ToolOutput) -> Self {
        self.build_outputs.borrow_mut().push_back(output);
        self
    }

    pub fn with_build_effect(mut self, effect: impl Fn(&[String]) + 'static) -> Self {
        self.build_effect = Some(Box::new(effect));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    pub fn query_count(&self) -> usize {
        self.count("targets")
    }

    pub fn build_count(&self) -> usize {
        self.count("build")
    }

    /// Target lists passed to each `buck build`, in call order.
    pub fn built_targets(&self) -> Vec<Vec<String>> {
        self.invocations
            .borrow()
            .iter()
            .filter(|inv| inv.subcommand() == Some("build"))
            .map(|inv| inv.args[1..].to_vec())
            .collect()
    }

    fn count(&self, subcommand: &str) -> usize {
        self.invocations
            .borrow()
            .iter()
            .filter(|inv| inv.subcommand() == Some(subcommand))
            .count()
    }
}

fn next_output(queue: &RefCell<VecDeque<ToolOutput>>) -> ToolOutput {
    let mut queue = queue.borrow_mut();
    if queue.len() > 1 {
        if let Some(output) = queue.pop_front() {
            return output;
        }
    }
    queue
        .front()
        .cloned()
        .unwrap_or_else(|| ToolOutput::success(""))
}

impl ToolRunner for FakeBuck {
    fn command_line(&self, invocation: &Invocation) -> String {
        format!("buck {}", invocation.args.join(" "))
    }

    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        self.invocations.borrow_mut().push(invocation.clone());

        match invocation.subcommand() {
            Some("targets") => Ok(next_output(&self.query_outputs)),
            Some("build") => {
                let output = next_output(&self.build_outputs);
                if output.status == buck_sources::ToolStatus::Success {
                    if let Some(effect) = &self.build_effect {
                        effect(&invocation.args[1..]);
                    }
                }
                Ok(output)
            }
            _ => Ok(ToolOutput::failed(1, "unknown subcommand")),
        }
    }
}
