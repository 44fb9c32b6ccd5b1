use base64::{engine::general_purpose::STANDARD, Engine as _};
use color_eyre::eyre::Result;
use rand::{rngs::OsRng, RngCore as _};

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // 64 random bytes, the same amount of key material the cookie signing key uses
    let mut bytes = [0u8; 64];
    OsRng.try_fill_bytes(&mut bytes)?;
    let secret = STANDARD.encode(bytes);

    println!("Generated session secret:");
    println!("{}", secret);
    println!();
    println!("You can use this value as your SECRET environment variable.");
    println!("For example, add the following to your .env file:");
    println!("SECRET=\"{}\"", secret);

    Ok(())
}
