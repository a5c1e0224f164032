use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "todo-cli")]
#[command(about = "Command-line client for the todo API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Admin API key (only used by `status` and `stats`)
    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks
    List {
        #[arg(short, long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// Add a new task
    Add { title: String },
    /// Show a single task
    Show { id: u64 },
    /// Change a task's title
    Edit { id: u64, title: String },
    /// Flip a task between completed and pending
    Toggle { id: u64 },
    /// Remove a task
    Remove { id: u64 },
    /// Check service status (admin)
    Status,
    /// Show task counts (admin)
    Stats,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Filter {
    All,
    Completed,
    Pending,
}

impl Filter {
    fn keeps(self, todo: &Value) -> bool {
        let completed = todo["completed"].as_bool().unwrap_or(false);
        match self {
            Filter::All => true,
            Filter::Completed => completed,
            Filter::Pending => !completed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');
    let collection = format!("{}/api/todo/", base);
    let item = |id: u64| format!("{}{}/", collection, id);

    match cli.command {
        Commands::List { filter } => {
            let res = client.get(&collection).send().await?;
            if let Some(Value::Array(todos)) = read_json(res).await? {
                let shown: Vec<&Value> = todos.iter().filter(|t| filter.keeps(t)).collect();
                if shown.is_empty() {
                    println!("No tasks found.");
                }
                for todo in shown {
                    print_todo(todo);
                }
            }
        }
        Commands::Add { title } => {
            let res = client
                .post(&collection)
                .json(&json!({ "title": title, "completed": false }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Show { id } => {
            let res = client.get(item(id)).send().await?;
            print_response(res).await?;
        }
        Commands::Edit { id, title } => {
            let res = client
                .patch(item(id))
                .json(&json!({ "title": title }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Toggle { id } => {
            let res = client.get(item(id)).send().await?;
            if let Some(todo) = read_json(res).await? {
                let completed = todo["completed"].as_bool().unwrap_or(false);
                let res = client
                    .patch(item(id))
                    .json(&json!({ "completed": !completed }))
                    .send()
                    .await?;
                print_response(res).await?;
            }
        }
        Commands::Remove { id } => {
            let res = client.delete(item(id)).send().await?;
            let status = res.status();
            if status.is_success() {
                println!("Removed task {}", id);
            } else {
                report_error(res).await;
            }
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", base))
                .headers(admin_headers(&cli.key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Stats => {
            let res = client
                .get(format!("{}/admin/stats", base))
                .headers(admin_headers(&cli.key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn admin_headers(key: &str) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", key))?,
    );
    Ok(headers)
}

fn print_todo(todo: &Value) {
    let mark = if todo["completed"].as_bool().unwrap_or(false) { "x" } else { " " };
    println!(
        "[{}] {:>4}  {}",
        mark,
        todo["id"],
        todo["title"].as_str().unwrap_or_default()
    );
}

async fn report_error(res: reqwest::Response) {
    eprintln!("Error: API returned status {}", res.status());
    if let Ok(text) = res.text().await {
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
    }
}

/// Parse a successful JSON response, reporting failures on stderr.
async fn read_json(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if !res.status().is_success() {
        report_error(res).await;
        return Ok(None);
    }
    Ok(Some(res.json().await?))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(json) = read_json(res).await? {
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(())
}
