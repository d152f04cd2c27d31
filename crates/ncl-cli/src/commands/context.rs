use super::LedgerArgs;

pub fn run(args: &LedgerArgs, chapter: u32) -> Result<(), String> {
    let mut ledger = args.open()?;
    let context = ledger
        .get_chapter_context(chapter)
        .map_err(|e| e.to_string())?;
    print!("{}", context.prompt_block);
    Ok(())
}
