use clap::Parser;
use client::game::{ClickResult, ClientGameState};
use client::input::{Command, ParseError, HELP_TEXT};
use client::network::GameClient;
use client::rendering::{self, Renderer};
use log::{info, warn};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the puzzle server
    #[arg(short = 's', long, default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Image to play (defaults to the first one listed)
    #[arg(short = 'i', long)]
    image: Option<u32>,

    /// Name to record high scores under (prompted for when absent)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Solve the puzzle with the development debug route and exit
    #[arg(short = 'a', long)]
    auto: bool,

    /// Board width in columns
    #[arg(short = 'w', long, default_value = "40")]
    width: usize,

    /// Board height in rows (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "12")]
    height: usize,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    info!("Connecting to: {}", args.server);

    let client = GameClient::new(&args.server)?;
    let renderer = Renderer::new(args.width, args.height);
    let mut state = ClientGameState::new();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let images = client.images().await?;
    println!("{}", rendering::image_list(&images));

    let image_id = match args.image.or_else(|| images.first().map(|image| image.id)) {
        Some(image_id) => image_id,
        None => return Ok(()),
    };
    start_puzzle(&client, &mut state, image_id).await?;

    if args.auto {
        solve(&client, &mut state).await?;
    } else {
        println!("{}", renderer.render(&state, Instant::now()));
        println!("{}", HELP_TEXT);
        play(&client, &mut state, &renderer, &mut input).await?;
    }

    if state.is_complete() {
        submit_score(&client, &state, args.name.as_deref(), &mut input).await?;
    }

    Ok(())
}

async fn start_puzzle(
    client: &GameClient,
    state: &mut ClientGameState,
    image_id: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    client.start(image_id).await?;
    match client.puzzle().await? {
        Some(view) => {
            state.load_puzzle(view, Instant::now());
            Ok(())
        }
        None => Err(format!("image {} did not start", image_id).into()),
    }
}

/// Interactive loop. Returns once the puzzle is complete or the player quits.
async fn play(
    client: &GameClient,
    state: &mut ClientGameState,
    renderer: &Renderer,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    while let Some(line) = input.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Click {
                position,
                character_id,
            } => match client.validate(position, character_id).await {
                Ok(response) => {
                    let result = state.apply_validation(character_id, &response);
                    println!("{}", rendering::click_result(&result));
                    if matches!(result, ClickResult::Completed { .. }) {
                        println!("{}", renderer.board(state));
                        return Ok(());
                    }
                    println!("{}", renderer.render(state, Instant::now()));
                }
                Err(e) => println!("{}", e.server_message().unwrap_or("Request failed")),
            },
            Command::Scores => {
                let scores = client.scores(state.image_id()).await?;
                println!("{}", rendering::score_table(&scores));
            }
            Command::Restart { image_id } => {
                match image_id.or_else(|| state.image_id()) {
                    Some(image_id) => match start_puzzle(client, state, image_id).await {
                        Ok(()) => println!("{}", renderer.render(state, Instant::now())),
                        Err(e) => println!("{}", e),
                    },
                    None => println!("No image to restart"),
                }
            }
            Command::Help => println!("{}", HELP_TEXT),
            Command::Quit => return Ok(()),
        }
    }

    Ok(())
}

/// Clicks every character at its true position
async fn solve(
    client: &GameClient,
    state: &mut ClientGameState,
) -> Result<(), Box<dyn std::error::Error>> {
    let characters = match client.debug_characters().await {
        Ok(characters) => characters,
        Err(e) => {
            warn!("Auto mode needs a development server: {}", e);
            return Err(e.into());
        }
    };

    for character in characters {
        if state.is_found(character.id) {
            continue;
        }
        let response = client.validate(character.position(), character.id).await?;
        let result = state.apply_validation(character.id, &response);
        println!("{}", rendering::click_result(&result));
    }

    Ok(())
}

async fn submit_score(
    client: &GameClient,
    state: &ClientGameState,
    name: Option<&str>,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = match name {
        Some(name) => name.to_string(),
        None => {
            println!("Enter your name:");
            input.next_line().await?.unwrap_or_default()
        }
    };

    match client.save_score(&name).await {
        Ok(()) => info!("Score saved for {}", name.trim()),
        Err(e) => println!("Score not saved: {}", e.server_message().unwrap_or("request failed")),
    }

    let scores = client.scores(state.image_id()).await?;
    println!("{}", rendering::score_table(&scores));
    Ok(())
}
