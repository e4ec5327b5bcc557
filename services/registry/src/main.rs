use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use common::SnapshotConfig;
use registry::{Goal, Meal, User, UserRegistry, Workout, validation};

#[derive(Parser)]
#[command(name = "fitness-registry")]
#[command(about = "Personal fitness profile registry", long_about = None)]
struct Cli {
    /// Snapshot file (overrides FITNESS_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// Repeat the password (defaults to --password)
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        gender: String,
        /// Height in centimetres
        #[arg(long)]
        height: f64,
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
    },
    /// Check a username and password
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Show a profile with its history and totals
    Show {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// List registered usernames
    List,
    /// Delete a profile and its whole history
    Delete {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log a workout session
    LogWorkout {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(long = "type")]
        workout_type: String,
        /// Duration in minutes
        #[arg(long)]
        duration: u32,
        #[arg(long)]
        calories: u32,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long, value_parser = validation::parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Log a meal
    LogMeal {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// Breakfast, Lunch, Dinner, Snack, ...
        #[arg(long = "type")]
        meal_type: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        calories: u32,
        #[arg(long, default_value_t = 0.0)]
        proteins: f64,
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        #[arg(long, default_value_t = 0.0)]
        fats: f64,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long, value_parser = validation::parse_date)]
        date: Option<NaiveDate>,
    },
    /// Set a new goal
    AddGoal {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(long = "type")]
        goal_type: String,
        /// Target description, e.g. "Lose 5kg"
        #[arg(long)]
        target: String,
        /// Deadline as YYYY-MM-DD
        #[arg(long, value_parser = validation::parse_date)]
        deadline: NaiveDate,
    },
    /// Mark a goal as completed (index as shown by `show`)
    CompleteGoal {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(long)]
        index: usize,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("registry=info,common=info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let cli = Cli::parse();

    let mut config = SnapshotConfig::from_env()?;
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }

    let registry = UserRegistry::open_from_config(&config)?;
    let report = registry.open_report();
    if !report.skipped.is_empty() || report.quarantined {
        warn!(
            "Skipped records {:?}; unreadable snapshot content kept at {}{}",
            report.skipped,
            config.data_file.display(),
            config.corrupt_suffix
        );
    }

    match cli.command {
        Commands::Register {
            username,
            password,
            confirm_password,
            name,
            age,
            gender,
            height,
            weight,
        } => {
            check(validation::validate_username(&username))?;
            check(validation::validate_password(
                &password,
                confirm_password.as_deref().unwrap_or(&password),
            ))?;
            check(validation::validate_age(age))?;
            check(validation::validate_height(height))?;
            check(validation::validate_weight(weight))?;

            let user = User::new(username, password, name, age, gender, height, weight);
            let user = registry.add_user(user)?;
            println!("Registered {}", user.username);
        }
        Commands::Login { username, password } => {
            let user = registry.authenticate_user(&username, &password)?;
            println!("Welcome back, {}", user.display_name);
        }
        Commands::Show { username, password } => {
            let user = registry.authenticate_user(&username, &password)?;
            print_profile(&user);
        }
        Commands::List => {
            for username in registry.usernames() {
                println!("{}", username);
            }
        }
        Commands::Delete { username, password } => {
            registry.authenticate_user(&username, &password)?;
            registry.delete_user(&username)?;
            println!("Deleted {}", username);
        }
        Commands::LogWorkout {
            username,
            password,
            workout_type,
            duration,
            calories,
            date,
            notes,
        } => {
            registry.authenticate_user(&username, &password)?;
            if duration == 0 {
                anyhow::bail!("Duration must be at least one minute");
            }

            let date = date.unwrap_or_else(today);
            let workout = Workout::new(workout_type, duration, calories, date).with_notes(notes);
            let user = registry.log_workout(&username, workout)?;
            println!("Logged workout #{}", user.workouts.len() - 1);
        }
        Commands::LogMeal {
            username,
            password,
            meal_type,
            name,
            calories,
            proteins,
            carbs,
            fats,
            date,
        } => {
            registry.authenticate_user(&username, &password)?;
            check(validation::validate_amount("Proteins", proteins))?;
            check(validation::validate_amount("Carbs", carbs))?;
            check(validation::validate_amount("Fats", fats))?;

            let meal = Meal::new(
                meal_type,
                name,
                calories,
                proteins,
                carbs,
                fats,
                date.unwrap_or_else(today),
            );
            let user = registry.log_meal(&username, meal)?;
            println!("Logged meal #{}", user.meals.len() - 1);
        }
        Commands::AddGoal {
            username,
            password,
            goal_type,
            target,
            deadline,
        } => {
            registry.authenticate_user(&username, &password)?;
            let user = registry.add_goal(&username, Goal::new(goal_type, target, deadline))?;
            println!("Added goal #{}", user.goals.len() - 1);
        }
        Commands::CompleteGoal {
            username,
            password,
            index,
        } => {
            registry.authenticate_user(&username, &password)?;
            registry.complete_goal(&username, index)?;
            println!("Completed goal #{}", index);
        }
    }

    Ok(())
}

fn check(result: Result<(), String>) -> Result<()> {
    result.map_err(anyhow::Error::msg)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_profile(user: &User) {
    println!("{} ({})", user.display_name, user.username);
    println!(
        "Age {} | {} | {:.1} cm | {:.1} kg",
        user.age, user.gender, user.height_cm, user.weight_kg
    );

    println!("\nWorkouts:");
    for (i, workout) in user.workouts.iter().enumerate() {
        println!(
            "  #{} {} {} - {} min, {} kcal {}",
            i,
            workout.date,
            workout.workout_type,
            workout.duration_minutes,
            workout.calories_burned,
            workout.notes
        );
    }

    println!("\nMeals:");
    for (i, meal) in user.meals.iter().enumerate() {
        println!(
            "  #{} {} {}: {} - {} kcal (P {:.1}g, C {:.1}g, F {:.1}g)",
            i,
            meal.date,
            meal.meal_type,
            meal.name,
            meal.calories,
            meal.proteins_g,
            meal.carbs_g,
            meal.fats_g
        );
    }

    let today = today();
    println!("\nGoals:");
    for (i, goal) in user.goals.iter().enumerate() {
        let status = if goal.completed {
            "done"
        } else if goal.is_overdue(today) {
            "overdue"
        } else {
            "open"
        };
        println!(
            "  #{} {}: {} by {} [{}]",
            i, goal.goal_type, goal.target_value, goal.deadline, status
        );
    }

    let summary = user.summary();
    println!(
        "\nTotals: {} workouts, {} min, {} kcal burned | {} meals, {} kcal eaten | net {} kcal | goals {}/{}",
        summary.workout_count,
        summary.total_minutes,
        summary.calories_burned,
        summary.meal_count,
        summary.calories_consumed,
        summary.net_calories(),
        summary.goals_completed,
        summary.goal_count
    );
}
