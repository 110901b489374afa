use trialock_core::TrialGate;

fn main() {
    // The one licensing call a host program makes, at startup.
    if !TrialGate::new().check() {
        eprintln!("No valid trial or activation. Exiting.");
        std::process::exit(1);
    }

    println!("License check passed. Application running.");
}
