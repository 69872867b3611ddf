use chat_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ChatError> {
    let client = ChatClient::from_env()?;

    let request = client
        .request()
        .conversation(&[], "Stream a short greeting.")
        .caller_id(generate_caller_id())
        .build()?;

    let mut printed = 0;
    let reply = client
        .stream(&request, |text| {
            print!("{}", &text[printed..]);
            printed = text.len();
        })
        .await?;

    println!();
    eprintln!("({:?}, {} frames)", reply.termination, reply.frames);
    Ok(())
}
