use clap::Subcommand;

use super::common::open_service;

#[derive(Subcommand)]
pub enum PasswordAction {
    /// Set the master password (minimum 8 characters)
    Set { password: String },
    /// Verify a password attempt
    Verify { password: String },
    /// Remove the master password, disabling the hardcore override
    Clear,
    /// Show whether the override capability exists
    Status,
}

pub fn run(action: PasswordAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = open_service()?;
    match action {
        PasswordAction::Set { password } => {
            service.set_master_password(&password)?;
            println!("master password set");
        }
        PasswordAction::Verify { password } => {
            println!("{}", service.verify_master_password(&password)?);
        }
        PasswordAction::Clear => {
            service.clear_master_password()?;
            println!("master password cleared");
        }
        PasswordAction::Status => {
            if service.has_master_password()? {
                println!("override capability: present");
            } else {
                println!("override capability: absent");
            }
        }
    }
    Ok(())
}
