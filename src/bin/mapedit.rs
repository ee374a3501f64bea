//! Process entry point: parses arguments, opens the store(s), dispatches to
//! the requested command, and commits.

use clap::Parser;

use mapedit::cli::{self, Cli, Command};
use mapedit::commands::{
    clone, deleteblocks, deletemeta, deleteobjects, deletetimers, fill, overlay, replaceininv,
    replacenodes, setmetavar, setparam2, Instance,
};
use mapedit::error::MapEditError;
use mapedit::progress::BarProgress;
use mapedit::store::SqliteStore;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(err) = cli::validate_names(&cli.command) {
        log::error!("{err}");
        std::process::exit(1);
    }

    let exit_code = async_std::task::block_on(run(cli));
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> i32 {
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            log::error!("{err}");
            1
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), MapEditError> {
    let db = SqliteStore::open(&cli.file).await?;
    let print_warnings = !cli.no_warnings;

    match cli.command {
        Command::Clone { p1, p2, offset, blockmode } => {
            let area = cli::required_area(&p1, &p2);
            let offset = cli::required_offset(&offset);
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            clone::run(&mut inst, area, offset, blockmode).await?;
            commit(inst).await
        }

        Command::Overlay { input_file, p1, p2, invert, offset, blockmode } => {
            let sdb = SqliteStore::open(&input_file).await?;
            let area = cli::optional_area(&p1, &p2)?;
            let offset = offset.as_ref().map(|o| cli::required_offset(o));
            let mut inst = Instance::new(db, Some(sdb), print_warnings, BarProgress::new());
            overlay::run(&mut inst, area, invert, offset, blockmode).await?;
            commit(inst).await
        }

        Command::Deleteblocks { p1, p2, invert } => {
            let area = cli::required_area(&p1, &p2);
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            deleteblocks::run(&mut inst, area, invert).await?;
            commit(inst).await
        }

        Command::Fill { replacenode, p1, p2, invert, blockmode } => {
            let area = cli::required_area(&p1, &p2);
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            fill::run(&mut inst, &replacenode, Some(area), invert, blockmode).await?;
            commit(inst).await
        }

        Command::Replacenodes { searchnode, replacenode, p1, p2, invert } => {
            let area = cli::optional_area(&p1, &p2)?;
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            replacenodes::run(&mut inst, &searchnode, &replacenode, area, invert).await?;
            commit(inst).await
        }

        Command::Setparam2 { paramval, searchnode, p1, p2, invert } => {
            let area = cli::optional_area(&p1, &p2)?;
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            setparam2::run(&mut inst, paramval, searchnode.as_deref(), area, invert).await?;
            commit(inst).await
        }

        Command::Deletemeta { searchnode, p1, p2, invert } => {
            let area = cli::optional_area(&p1, &p2)?;
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            deletemeta::run(&mut inst, searchnode.as_deref(), area, invert).await?;
            commit(inst).await
        }

        Command::Setmetavar { metakey, metavalue, searchnode, p1, p2, invert } => {
            let area = cli::optional_area(&p1, &p2)?;
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            setmetavar::run(&mut inst, &metakey, &metavalue, searchnode.as_deref(), area, invert).await?;
            commit(inst).await
        }

        Command::Replaceininv { searchitem, replaceitem, searchnode, deletemeta, p1, p2, invert } => {
            let area = cli::optional_area(&p1, &p2)?;
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            replaceininv::run(
                &mut inst,
                searchnode.as_deref(),
                &searchitem,
                &replaceitem,
                deletemeta,
                area,
                invert,
            )
            .await?;
            commit(inst).await
        }

        Command::Deletetimers { searchnode, p1, p2, invert } => {
            let area = cli::optional_area(&p1, &p2)?;
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            deletetimers::run(&mut inst, searchnode.as_deref(), area, invert).await?;
            commit(inst).await
        }

        Command::Deleteobjects { searchobj, items, p1, p2, invert } => {
            let area = cli::optional_area(&p1, &p2)?;
            let mut inst = Instance::new(db, None, print_warnings, BarProgress::new());
            deleteobjects::run(&mut inst, searchobj.as_deref(), items, area, invert).await?;
            commit(inst).await
        }
    }
}

async fn commit(mut inst: Instance<BarProgress>) -> Result<(), MapEditError> {
    inst.db.commit().await?;
    if let Some(sdb) = inst.sdb.as_mut() {
        sdb.commit().await?;
    }
    Ok(())
}
