use addressbook_core::{
	Address, AddressBook, AddressLookup, DurableStore, HttpAddressLookup, JsonFileStore,
	SyncManager, ADDRESSES_KEY,
};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "addressbook", about = "Postcode address book")]
struct Cli {
	/// Path to the address book data directory
	#[arg(long)]
	data_dir: Option<PathBuf>,

	/// Base URL of the address lookup service
	#[arg(long, default_value = "http://localhost:3000")]
	base_url: String,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// List saved addresses
	List,
	/// Look up address candidates for a postcode and house number
	Lookup { postcode: String, house_number: String },
	/// Look up an address and save it with a person's name
	Add {
		postcode: String,
		house_number: String,
		#[arg(long)]
		first_name: String,
		#[arg(long)]
		last_name: String,
		/// Which candidate to save when the lookup returns more than one
		#[arg(long, default_value_t = 0)]
		pick: usize,
	},
	/// Remove a saved address by id
	Remove { id: String },
}

struct Session {
	book: Arc<AddressBook>,
	store: Arc<dyn DurableStore>,
	// keeps the observer task alive for the life of the session
	_sync: Arc<SyncManager>,
}

impl Session {
	async fn open(data_dir: PathBuf) -> Self {
		let book = Arc::new(AddressBook::new());
		let store: Arc<dyn DurableStore> = Arc::new(JsonFileStore::new(data_dir));
		let sync = SyncManager::new(book.clone(), store.clone());

		sync.load().await;
		sync.wait_ready().await;

		Self {
			book,
			store,
			_sync: sync,
		}
	}

	/// Wait until the durable store holds the current collection, so the
	/// process doesn't exit before the write-back lands.
	async fn flush(&self) -> Result<()> {
		let want = serde_json::to_value(self.book.list())?;

		tokio::time::timeout(Duration::from_secs(10), async {
			loop {
				if self.store.get(ADDRESSES_KEY).await.ok().flatten().as_ref() == Some(&want) {
					return;
				}
				tokio::time::sleep(Duration::from_millis(50)).await;
			}
		})
		.await
		.context("timed out waiting for the address book to be saved")
	}
}

fn default_data_dir() -> Result<PathBuf> {
	dirs::data_dir()
		.map(|dir| dir.join("addressbook"))
		.ok_or_else(|| anyhow!("could not determine a data directory, pass --data-dir"))
}

fn print_address(address: &Address) {
	let person = format!("{} {}", address.first_name, address.last_name);
	let person = person.trim();
	println!(
		"{}{} {}, {} {}  [{}]",
		if person.is_empty() {
			String::new()
		} else {
			format!("{person}: ")
		},
		address.street,
		address.house_number,
		address.postcode,
		address.city,
		address.id
	);
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let cli = Cli::parse();
	let data_dir = match cli.data_dir {
		Some(dir) => dir,
		None => default_data_dir()?,
	};

	match cli.command {
		Commands::List => {
			let session = Session::open(data_dir).await;
			let addresses = session.book.list();
			if addresses.is_empty() {
				println!("address book is empty");
			}
			for address in &addresses {
				print_address(address);
			}
		}

		Commands::Lookup {
			postcode,
			house_number,
		} => {
			let lookup = HttpAddressLookup::new(cli.base_url);
			let candidates = lookup.find(&postcode, &house_number).await?;
			if candidates.is_empty() {
				bail!("no addresses found for the given postcode and house number");
			}
			for (index, raw) in candidates.into_iter().enumerate() {
				let address = Address::normalize(raw);
				print!("[{index}] ");
				print_address(&address);
			}
		}

		Commands::Add {
			postcode,
			house_number,
			first_name,
			last_name,
			pick,
		} => {
			if first_name.trim().is_empty() || last_name.trim().is_empty() {
				bail!("first name and last name are required");
			}

			let lookup = HttpAddressLookup::new(cli.base_url);
			let candidates = lookup
				.find(&postcode, &house_number)
				.await?
				.into_iter()
				.map(Address::normalize)
				.collect::<Vec<_>>();
			if candidates.is_empty() {
				bail!("no addresses found for the given postcode and house number");
			}

			let session = Session::open(data_dir).await;
			session.book.set_candidates(candidates.clone());

			let candidate = candidates
				.get(pick)
				.ok_or_else(|| anyhow!("--pick {pick} is out of range"))?;
			if !session.book.select(&candidate.id) {
				bail!("selected address not found");
			}

			let selected = session
				.book
				.selected()
				.ok_or_else(|| anyhow!("selected address not found"))?;
			let entry = selected.with_person(first_name.trim(), last_name.trim());
			print_address(&entry);
			session.book.add(entry);
			session.flush().await?;
		}

		Commands::Remove { id } => {
			let session = Session::open(data_dir).await;
			if !session.book.list().iter().any(|a| a.id == id) {
				println!("no address with id {id}");
				return Ok(());
			}
			session.book.remove(&id);
			session.flush().await?;
			println!("removed {id}");
		}
	}

	Ok(())
}
