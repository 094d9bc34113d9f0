use std::{future::Future, pin::Pin};

use crate::error::{BuildError, Result};
use crate::pipeline::Pipeline;

pub type CommandFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

pub enum Handler<C> {
    /// Takes no arguments; dispatch moves on to the next command name.
    Run(for<'a> fn(&'a C) -> CommandFuture<'a>),
    /// Consumes every remaining argument and ends dispatch.
    RunArgs(for<'a> fn(&'a C, &'a [String]) -> CommandFuture<'a>),
}

pub struct Command<C> {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: Handler<C>,
}

/// Named commands in registration order.
pub struct Commands<C> {
    commands: Vec<Command<C>>,
}

impl<C> Default for Commands<C> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<C> Commands<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cmd(
        mut self,
        name: &'static str,
        description: &'static str,
        run: for<'a> fn(&'a C) -> CommandFuture<'a>,
    ) -> Self {
        self.commands.push(Command {
            name,
            description,
            handler: Handler::Run(run),
        });
        self
    }

    pub fn cmd_args(
        mut self,
        name: &'static str,
        description: &'static str,
        run: for<'a> fn(&'a C, &'a [String]) -> CommandFuture<'a>,
    ) -> Self {
        self.commands.push(Command {
            name,
            description,
            handler: Handler::RunArgs(run),
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Command<C>> {
        self.commands.iter().find(|command| command.name == name)
    }

    pub fn usage(&self) -> String {
        let width = self
            .commands
            .iter()
            .map(|command| command.name.len())
            .max()
            .unwrap_or(0)
            + 1;

        let mut usage = String::from("Available commands:\n");
        for command in &self.commands {
            usage.push_str(&format!(
                "  {:<width$} {}\n",
                format!("{}:", command.name),
                command.description,
                width = width
            ));
        }
        usage
    }

    /// Runs `args` left to right as command names. An argument-taking command receives
    /// the rest of the list. Without any arguments the available commands are printed.
    pub async fn dispatch(&self, context: &C, args: &[String]) -> Result<()> {
        if args.is_empty() {
            print!("{}", self.usage());
            return Ok(());
        }

        for (i, name) in args.iter().enumerate() {
            let command = self
                .get(name)
                .ok_or_else(|| BuildError::Usage(format!("Command not found: {}", name)))?;

            match command.handler {
                Handler::Run(run) => run(context).await?,
                Handler::RunArgs(run) => return run(context, &args[i + 1..]).await,
            }
        }

        Ok(())
    }
}

fn single_component_name<'a>(command: &str, args: &'a [String]) -> Result<&'a str> {
    match args {
        [name] => Ok(name.as_str()),
        _ => Err(BuildError::Usage(format!(
            "{} expected exactly one argument (component-name), got: [{}]",
            command,
            args.join(", ")
        ))),
    }
}

fn build<'a>(pipeline: &'a Pipeline<'_>) -> CommandFuture<'a> {
    Box::pin(pipeline.build_all())
}

fn update_rpc_stubs<'a>(pipeline: &'a Pipeline<'_>) -> CommandFuture<'a> {
    Box::pin(pipeline.update_rpc_stubs())
}

fn generate_new_component<'a>(pipeline: &'a Pipeline<'_>, args: &'a [String]) -> CommandFuture<'a> {
    Box::pin(async move {
        let name = single_component_name("generate-new-component", args)?;
        pipeline.generate_new_component(name)
    })
}

fn deploy<'a>(pipeline: &'a Pipeline<'_>) -> CommandFuture<'a> {
    Box::pin(pipeline.deploy_all())
}

fn deploy_component<'a>(pipeline: &'a Pipeline<'_>, args: &'a [String]) -> CommandFuture<'a> {
    Box::pin(async move {
        let name = single_component_name("deploy-component", args)?;
        pipeline.deploy_component(name).await
    })
}

fn run_tests<'a>(pipeline: &'a Pipeline<'_>) -> CommandFuture<'a> {
    Box::pin(pipeline.test())
}

fn clean<'a>(pipeline: &'a Pipeline<'_>) -> CommandFuture<'a> {
    Box::pin(async move { pipeline.clean() })
}

pub fn project_commands<'p>() -> Commands<Pipeline<'p>> {
    Commands::new()
        .cmd("build", "build all components", build)
        .cmd(
            "update-rpc-stubs",
            "build stubs and add them to dependent components based on [dependencies]",
            update_rpc_stubs,
        )
        .cmd_args(
            "generate-new-component",
            "generate a new component from the template, expects <component-name>",
            generate_new_component,
        )
        .cmd("deploy", "deploy (create or update) all components", deploy)
        .cmd_args(
            "deploy-component",
            "deploy (create or update) the specified component, expects <component-name>",
            deploy_component,
        )
        .cmd("test", "run the configured test command", run_tests)
        .cmd("clean", "remove build outputs and generated bindings", clean)
}
