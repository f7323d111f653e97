/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::error::Error;
use std::path::PathBuf;

use aws_sdk_s3::error::DisplayErrorContext;
use clap::{CommandFactory, Parser, Subcommand};
use s3_object_adapter::types::{AddressingMode, ObjectIdentity};
use s3_object_adapter::Client;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "object-store")]
#[command(about = "Reads and writes objects through the S3 object store adapter.")]
#[command(
    long_about = "Reads and writes objects through the S3 object store adapter.\n\n\
    Connection settings are read from the OBJECT_STORE_* environment variables."
)]
pub struct Args {
    /// Account the container belongs to
    #[arg(long, required = true)]
    account: String,

    /// Container to operate on
    #[arg(long, required = true)]
    container: String,

    /// Name buckets after the account instead of the container
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    account_as_bucket: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Upload a local file as an object
    Put {
        #[command(flatten)]
        object: ObjectArgs,

        /// Local file to upload
        #[arg(long, required = true)]
        file: PathBuf,
    },

    /// Print an object to stdout
    Get {
        #[command(flatten)]
        object: ObjectArgs,
    },

    /// Delete an object
    Delete {
        #[command(flatten)]
        object: ObjectArgs,
    },

    /// Merge `key=value` pairs into an object's metadata, or print it when none are given
    Meta {
        #[command(flatten)]
        object: ObjectArgs,

        /// Entries to add
        entries: Vec<String>,
    },

    /// Merge `key=value` pairs into the container tags, or print them when none are given
    Tag {
        /// Tags to add
        entries: Vec<String>,
    },

    /// List the objects of the container
    List,
}

#[derive(Debug, Clone, clap::Args)]
struct ObjectArgs {
    /// Object name
    #[arg(required = true)]
    name: String,

    /// Source path segment
    #[arg(long)]
    source: Option<String>,

    /// Process path segment
    #[arg(long)]
    process: Option<String>,
}

impl Args {
    fn identity(&self, object: &ObjectArgs) -> ObjectIdentity {
        ObjectIdentity::new(&self.account, &self.container, &object.name)
            .set_source(object.source.clone())
            .set_process(object.process.clone())
    }
}

fn invalid_arg(message: &str) -> ! {
    Args::command()
        .error(clap::error::ErrorKind::InvalidValue, message)
        .exit()
}

fn parse_entries(entries: &[String]) -> std::collections::HashMap<String, String> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.to_owned()),
            None => invalid_arg(&format!("expected key=value, got {entry}")),
        })
        .collect()
}

async fn run(client: &Client, args: &Args) -> Result<(), BoxError> {
    match &args.command {
        Command::Put { object, file } => {
            let body = std::fs::read(file)?;
            let len = body.len();
            client.put_object(&args.identity(object), body).await?;
            println!("uploaded {len} bytes");
        }
        Command::Get { object } => {
            let body = client.get_object(&args.identity(object)).await?;
            println!("{}", String::from_utf8_lossy(&body));
        }
        Command::Delete { object } => {
            client.delete_object(&args.identity(object)).await?;
        }
        Command::Meta { object, entries } => {
            let id = args.identity(object);
            let metadata = if entries.is_empty() {
                client.get_metadata(&id).await?
            } else {
                client.add_object_metadata(&id, parse_entries(entries)).await?
            };
            for (key, value) in metadata {
                println!("{key}={value}");
            }
        }
        Command::Tag { entries } => {
            if !entries.is_empty() {
                client
                    .add_tags(&args.account, &args.container, parse_entries(entries))
                    .await?;
            }
            for (key, value) in client.get_tags(&args.account, &args.container).await? {
                println!("{key}={value}");
            }
        }
        Command::List => match client.get_all_objects(&args.account, &args.container).await? {
            Some(objects) => {
                for object in objects {
                    let path = [object.source(), object.process(), Some(object.object_name())]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join("/");
                    println!("{path}\t{:?}", object.last_modified());
                }
            }
            None => println!("no objects"),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    let mut loader = s3_object_adapter::from_env();
    if args.account_as_bucket {
        loader = loader.addressing_mode(AddressingMode::AccountAsBucket);
    }
    let config = loader.load()?;
    let client = Client::new(config);

    if let Err(ref err) = run(&client, &args).await {
        tracing::error!("operation failed: {}", DisplayErrorContext(err.as_ref()));
    }

    Ok(())
}
