use std::env;

use mysensors_codec::message::Message;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        return Err("Provide 1 argument: a serial line, e.g. \"5;2;1;0;1;23.5\"".into());
    }

    let line = args.pop().ok_or("No line argument")?;
    let message = line.parse::<Message>()?;

    println!(
        "message {:?},\nbytes: {:02x?},\nrouted bytes: {:02x?},\nline: {:?}",
        &message,
        message.as_bytes(),
        message.as_routed_bytes(),
        message.to_line().as_str()
    );
    Ok(())
}
