use anyhow::Result;
use resolwe::Resolwe;

fn main() -> Result<()> {
    // Create a session to interact with the server.
    // Print request details to stdout for every call on this session.
    let res = Resolwe::connect("<USERNAME>", "<PASSWORD>", "https://app.genialis.com")?
        .with_verbose(true);

    // Get sample meta-data from the server.
    let sample = res.sample().get("human-example-chr22")?;

    // Download files associated with the sample.
    sample.download(&res, None)?;

    Ok(())
}
